//! Named, ordered region lists and their `names~ values` text form.
//!
//! Both sets serialize as the comma-joined names, a tilde, then four
//! whitespace-separated numbers per entry in name order:
//!
//! ```text
//! door,exit~ 0 5 10 5 3 0 3 2
//! ```
//!
//! For a [`LineSet`] the four numbers are the endpoints `x1 y1 x2 y2`; for a
//! [`RectDomainSet`] they are `minX minY w h`.

use indexmap::IndexMap;
use stride_core::{Segment, Vec2};

use crate::domain::RectDomain;
use crate::error::GridError;

/// Named rectangular regions in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RectDomainSet {
    regions: IndexMap<String, RectDomain>,
}

impl RectDomainSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a region. A replaced region keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, region: RectDomain) -> Option<RectDomain> {
        self.regions.insert(name.into(), region)
    }

    /// Region by name.
    pub fn get(&self, name: &str) -> Option<&RectDomain> {
        self.regions.get(name)
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// True when the set is empty.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.regions.keys().map(String::as_str)
    }

    /// `(name, region)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RectDomain)> + '_ {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse the `names~ minX minY w h ...` form.
    ///
    /// # Errors
    ///
    /// [`GridError::Parse`] on a missing tilde, a non-numeric value, a value
    /// count that is not four per name, or a duplicate name;
    /// [`GridError::InvalidDomain`] for a negative extent.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let entries = parse_entries(text)?;
        let mut set = Self::new();
        for (name, [x, y, w, h]) in entries {
            let region = RectDomain::new(Vec2::new(x, y), Vec2::new(w, h))?;
            if set.insert(name.clone(), region).is_some() {
                return Err(duplicate(&name));
            }
        }
        Ok(set)
    }

    /// Serialize in the form accepted by [`parse`](Self::parse).
    pub fn to_text(&self) -> String {
        format_entries(self.regions.iter().map(|(name, r)| {
            let (min, size) = (r.min_corner(), r.size());
            (name.as_str(), [min.x, min.y, size.x, size.y])
        }))
    }
}

/// Named oriented segments in insertion order.
///
/// Orientation matters: flow analysis signs each crossing by the cross
/// product of the line direction and the agent's displacement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineSet {
    lines: IndexMap<String, Segment>,
}

impl LineSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a line. A replaced line keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, line: Segment) -> Option<Segment> {
        self.lines.insert(name.into(), line)
    }

    /// Line by name.
    pub fn get(&self, name: &str) -> Option<&Segment> {
        self.lines.get(name)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the set is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.keys().map(String::as_str)
    }

    /// `(name, line)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Segment)> + '_ {
        self.lines.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse the `names~ x1 y1 x2 y2 ...` form.
    ///
    /// # Errors
    ///
    /// [`GridError::Parse`] on a missing tilde, a non-numeric value, a value
    /// count that is not four per name, or a duplicate name.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let mut set = Self::new();
        for (name, [x1, y1, x2, y2]) in parse_entries(text)? {
            let line = Segment::new(Vec2::new(x1, y1), Vec2::new(x2, y2));
            if set.insert(name.clone(), line).is_some() {
                return Err(duplicate(&name));
            }
        }
        Ok(set)
    }

    /// Serialize in the form accepted by [`parse`](Self::parse).
    pub fn to_text(&self) -> String {
        format_entries(self.lines.iter().map(|(name, s)| {
            (name.as_str(), [s.start.x, s.start.y, s.end.x, s.end.y])
        }))
    }
}

fn duplicate(name: &str) -> GridError {
    GridError::Parse {
        reason: format!("duplicate name {name:?}"),
    }
}

fn parse_entries(text: &str) -> Result<Vec<(String, [f32; 4])>, GridError> {
    let (names, values) = text.split_once('~').ok_or_else(|| GridError::Parse {
        reason: "missing '~' between names and values".to_string(),
    })?;
    let names: Vec<String> = names
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    let values = values
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f32>().map_err(|_| GridError::Parse {
                reason: format!("not a number: {tok:?}"),
            })
        })
        .collect::<Result<Vec<f32>, _>>()?;
    if values.len() != names.len() * 4 {
        return Err(GridError::Parse {
            reason: format!(
                "{} names need {} values, found {}",
                names.len(),
                names.len() * 4,
                values.len()
            ),
        });
    }
    Ok(names
        .into_iter()
        .zip(values.chunks_exact(4))
        .map(|(name, v)| (name, [v[0], v[1], v[2], v[3]]))
        .collect())
}

fn format_entries<'a>(entries: impl Iterator<Item = (&'a str, [f32; 4])>) -> String {
    let mut names = Vec::new();
    let mut values = String::new();
    for (name, vals) in entries {
        names.push(name);
        for v in vals {
            values.push(' ');
            values.push_str(&v.to_string());
        }
    }
    format!("{}~{}", names.join(","), values)
}
