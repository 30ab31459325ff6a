//! Running whole projects against in-memory inputs.

use std::fs;

use stride_analysis::{MemoryEnvironment, Project, TaskOutcome, TaskRunner, TimeSeries};
use stride_core::Vec2;
use stride_gfs::{GfsReader, PipelineConfig};
use stride_grid::RectDomain;
use stride_test_utils::{box_walls, scratch_path, straight_walkers};

fn project_text(out: &str) -> String {
    let common = |name: &str| format!("SCB || walk.scb\noutFldr || {out}\nworkName || {name}\n");
    let (walk, cells) = (common("walk"), common("cells"));
    format!(
        "Task count || 6\n\
         \nDENSITY\n{walk}domain || 0 0 10 10\ncellSize || 0.5\nkernel || Biweight\nsmoothParam || 0.5\n\
         \nDENSITY\n{cells}obstacle || walls.txt\ndomain || 0 0 10 10\ncellSize || 0.5\nmethod || Voronoi\nmaxRadius || 3\n\
         \nSPEED\n{walk}domain || 0 0 10 10\ncellSize || 0.5\nwindow || 2\n\
         \nFLOW\n{walk}lines || gate~ 2 0 2 10\n\
         \nPOPULATION\n{walk}regions || left~ 0 0 2 10\n\
         \nFUND DIAG\n{walk}timeStep || 0\nregions || all~ 0 0 10 10\n"
    )
}

fn environment() -> MemoryEnvironment {
    let domain = RectDomain::new(Vec2::ZERO, Vec2::new(10.0, 10.0)).unwrap();
    MemoryEnvironment::new()
        .with_trajectory("walk.scb", straight_walkers(3, 8, Vec2::new(1.0, 0.0), 0.25))
        .with_obstacles("walls.txt", box_walls(&domain))
}

#[test]
fn a_project_runs_end_to_end() {
    let out = scratch_path("runner_out");
    let text = project_text(&out.display().to_string());
    let project = Project::parse(&text).unwrap();
    let runner = TaskRunner::new(environment())
        .with_config(PipelineConfig::default().with_thread_count(2));

    let outcomes = runner.run(&project);
    assert_eq!(outcomes.len(), 6);

    // timeStep 0 is not a valid step duration.
    assert_eq!(outcomes[5], TaskOutcome::Inactive);

    let written: Vec<_> = outcomes[..5]
        .iter()
        .map(|o| match o {
            TaskOutcome::Written(p) => p.clone(),
            other => panic!("unexpected outcome {other:?}"),
        })
        .collect();
    assert!(written[0].ends_with("walk_density.gfs"));
    assert!(written[1].ends_with("cells_density.gfs"));
    assert!(written[2].ends_with("walk_speed.gfs"));

    let kde = GfsReader::open_path(&written[0]).unwrap();
    assert_eq!(kde.len(), 8);
    assert_eq!(kde.grid().resolution(), (20, 20));

    let mut speed = GfsReader::open_path(&written[2]).unwrap();
    assert_eq!(speed.len(), 6);
    assert!((speed.header().max - 1.0).abs() < 1e-4);
    let (_, first) = speed.next_frame::<f32>().unwrap().unwrap();
    assert_eq!(first, 0);

    let flow = TimeSeries::parse(&fs::read_to_string(&written[3]).unwrap()).unwrap();
    let gate = flow.column("gate").unwrap();
    assert_eq!(gate.len(), 8);
    // Walkers start at x = 1 and move 0.25 per frame: all three pass x = 2
    // on frame 4.
    assert_eq!(gate[4], -3.0);
    assert_eq!(gate.iter().sum::<f64>(), -3.0);

    let population = TimeSeries::parse(&fs::read_to_string(&written[4]).unwrap()).unwrap();
    assert_eq!(population.column("left").unwrap()[0], 3.0);

    fs::remove_dir_all(&out).unwrap();
}

#[test]
fn a_failing_task_does_not_stop_the_rest() {
    let out = scratch_path("runner_fail");
    let out_text = out.display().to_string();
    // A smoothing parameter this wide cannot be sampled, so the kernel
    // density task fails at run time.
    let text = format!(
        "Task count || 2\n\
         \nDENSITY\nSCB || walk.scb\noutFldr || {out_text}\nworkName || bad\n\
         domain || 0 0 10 10\ncellSize || 0.5\nkernel || Gaussian\nsmoothParam || 0.5\n\
         \nPOPULATION\nSCB || walk.scb\noutFldr || {out_text}\nworkName || good\nregions || r~ 0 0 10 10\n"
    );
    let mut project = Project::parse(&text).unwrap();
    project.tasks[0].set("smoothParam", "1000");

    let outcomes = TaskRunner::new(environment())
        .with_config(PipelineConfig::default().with_thread_count(1))
        .run(&project);
    assert!(matches!(outcomes[0], TaskOutcome::Failed(_)), "{outcomes:?}");
    assert!(matches!(outcomes[1], TaskOutcome::Written(_)));

    fs::remove_dir_all(&out).unwrap();
}

#[test]
fn existing_outputs_are_kept_without_overwrite() {
    let out = scratch_path("runner_keep");
    let text = project_text(&out.display().to_string());
    let project = Project::parse(&text).unwrap();
    let config = PipelineConfig::default().with_thread_count(1);

    let first = TaskRunner::new(environment())
        .with_config(config.clone())
        .run(&project);
    assert!(matches!(first[3], TaskOutcome::Written(_)));

    let second = TaskRunner::new(environment())
        .with_config(config.with_overwrite(false))
        .run(&project);
    for outcome in &second[..5] {
        assert!(matches!(outcome, TaskOutcome::Skipped { .. }), "{outcome:?}");
    }

    fs::remove_dir_all(&out).unwrap();
}

#[test]
fn a_damaged_output_is_recomputed_without_overwrite() {
    let out = scratch_path("runner_damaged");
    fs::create_dir_all(&out).unwrap();
    let damaged = out.join("walk_density.gfs");
    fs::write(&damaged, [0u8; 8]).unwrap();

    let text = project_text(&out.display().to_string());
    let project = Project::parse(&text).unwrap();
    let outcomes = TaskRunner::new(environment())
        .with_config(
            PipelineConfig::default()
                .with_thread_count(1)
                .with_overwrite(false),
        )
        .run(&project);
    assert_eq!(outcomes[0], TaskOutcome::Written(damaged.clone()));
    assert_eq!(GfsReader::open_path(&damaged).unwrap().len(), 8);

    fs::remove_dir_all(&out).unwrap();
}
