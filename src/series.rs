//! Series are the primary internal storage type.
//!
//! A `Registry` holds one `Series` per metric dimension, keyed by name.
//! Every series shares the registry's capacity. Charts are built by
//! grouping series together, see `ChartDef`.

use ring::{self, RingBuffer};
use std::collections::BTreeMap;

/// A single charted observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    /// The x-axis label, usually the sample time as HH:MM:SS.
    pub label: String,
    /// The observed value.
    pub value: f64,
}

/// A named, bounded, arrival-ordered run of points
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    points: RingBuffer<Point>,
}

impl Series {
    /// Create an empty series able to hold `capacity` points
    ///
    /// # Examples
    ///
    /// ```
    /// use nodestats::series::Series;
    ///
    /// let mut s = Series::new("reqq.size", 2).unwrap();
    /// s.push("00:00:01", 1.0);
    /// s.push("00:00:02", 2.0);
    /// s.push("00:00:03", 3.0);
    /// assert_eq!(vec![2.0, 3.0], s.values());
    /// ```
    pub fn new<S>(name: S, capacity: usize) -> Result<Series, ring::Error>
    where
        S: Into<String>,
    {
        Ok(Series {
            name: name.into(),
            points: RingBuffer::new(capacity)?,
        })
    }

    /// The series name, e.g. `spam.gtta`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a point, evicting the oldest if the series is full.
    pub fn push<S>(&mut self, label: S, value: f64)
    where
        S: Into<String>,
    {
        self.points.push(Point {
            label: label.into(),
            value: value,
        });
    }

    /// Number of points held.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no point has been pushed.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most points the series will hold.
    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }

    /// The newest point.
    pub fn latest(&self) -> Option<&Point> {
        self.points.latest()
    }

    /// Points, oldest to newest.
    pub fn points(&self) -> Vec<Point> {
        self.points.to_vec()
    }

    /// Point labels, oldest to newest.
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.label.clone()).collect()
    }

    /// Point values, oldest to newest.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Which series make up a chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Members {
    /// A fixed list of (series name, dataset label) pairs, in display order.
    Fixed(&'static [(&'static str, &'static str)]),
    /// Every series whose name begins with the prefix. The dataset label is
    /// the remainder of the name.
    Prefix(&'static str),
}

/// Static description of one chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartDef {
    /// Key the chart is looked up by.
    pub name: &'static str,
    /// Human readable heading.
    pub title: &'static str,
    /// The series plotted.
    pub members: Members,
}

/// One line of a chart
///
/// `data` is aligned with the chart's labels. A member with a shorter
/// history than the chart's longest is padded with `None` at the front.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    /// Legend entry.
    pub label: String,
    /// One value per chart label, `None` where the member has no point.
    pub data: Vec<Option<f64>>,
}

impl Dataset {
    /// The newest value, if any.
    pub fn latest(&self) -> Option<f64> {
        self.data.last().and_then(|v| *v)
    }

    /// Number of labels at which this line has a value.
    pub fn points(&self) -> usize {
        self.data.iter().filter(|v| v.is_some()).count()
    }
}

/// Chart-ready series: shared x-axis labels plus one dataset per line
///
/// Every dataset holds exactly `labels.len()` entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartData {
    /// The shared x-axis.
    pub labels: Vec<String>,
    /// One entry per member series.
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// True if no member has any point.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Collection of series sharing one capacity
#[derive(Debug, Clone)]
pub struct Registry {
    series: BTreeMap<String, Series>,
    blank: RingBuffer<Point>,
}

impl Registry {
    /// Create a registry whose series each hold `capacity` points.
    ///
    /// Capacity is checked here, once, rather than on every series
    /// creation.
    pub fn new(capacity: usize) -> Result<Registry, ring::Error> {
        Ok(Registry {
            series: BTreeMap::new(),
            blank: RingBuffer::new(capacity)?,
        })
    }

    /// Points each series holds.
    pub fn capacity(&self) -> usize {
        self.blank.capacity()
    }

    /// The named series, created empty if it does not exist yet.
    pub fn get_or_create(&mut self, name: &str) -> &mut Series {
        let blank = &self.blank;
        self.series.entry(name.to_string()).or_insert_with(|| {
            trace!("creating series {}", name);
            Series {
                name: name.to_string(),
                points: blank.clone(),
            }
        })
    }

    /// Push a point into the named series, creating it if need be.
    pub fn update<S>(&mut self, name: &str, label: S, value: f64)
    where
        S: Into<String>,
    {
        self.get_or_create(name).push(label, value)
    }

    /// The named series, if it has ever received a point.
    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True if no series exists.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }

    /// Copy out every series, oldest to newest.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Point>> {
        self.series
            .iter()
            .map(|(k, v)| (k.clone(), v.points()))
            .collect()
    }

    /// Build the chart-library shape for `def`
    ///
    /// Labels are taken from the member with the longest history. Members
    /// share their newest points with the chart, so shorter histories are
    /// aligned to the right and padded with `None`. A member that has
    /// never received a point is all `None`.
    pub fn chart(&self, def: &ChartDef) -> ChartData {
        let members: Vec<(String, Option<&Series>)> = match def.members {
            Members::Fixed(fixed) => fixed
                .iter()
                .map(|&(name, label)| (label.to_string(), self.series.get(name)))
                .collect(),
            Members::Prefix(prefix) => self.series
                .iter()
                .filter(|&(name, _)| name.starts_with(prefix))
                .map(|(name, s)| (name[prefix.len()..].to_string(), Some(s)))
                .collect(),
        };

        let longest = members
            .iter()
            .filter_map(|&(_, s)| s)
            .fold(None, |acc: Option<&Series>, s| match acc {
                Some(a) if a.len() >= s.len() => Some(a),
                _ => Some(s),
            });
        let labels = longest.map(|s| s.labels()).unwrap_or_default();
        let width = labels.len();
        let datasets = members
            .into_iter()
            .map(|(label, s)| {
                let values = s.map(|s| s.values()).unwrap_or_default();
                let mut data = vec![None; width - values.len()];
                data.extend(values.into_iter().map(Some));
                Dataset {
                    label: label,
                    data: data,
                }
            })
            .collect();

        ChartData {
            labels: labels,
            datasets: datasets,
        }
    }
}
