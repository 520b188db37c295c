use common::types::Sample;
use std::collections::HashMap;

/// Samples partitioned by `host`, keeping arrival order within each host.
///
/// Hosts iterate in the order they were first seen.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HostSeries {
    hosts: Vec<(String, Vec<Sample>)>,
    index: HashMap<String, usize>,
}

impl HostSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        match self.index.get(&sample.host) {
            Some(&i) => self.hosts[i].1.push(sample),
            None => {
                self.index.insert(sample.host.clone(), self.hosts.len());
                self.hosts.push((sample.host.clone(), vec![sample]));
            }
        }
    }

    pub fn get(&self, host: &str) -> Option<&[Sample]> {
        self.index.get(host).map(|&i| self.hosts[i].1.as_slice())
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(|(host, _)| host.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Sample])> {
        self.hosts
            .iter()
            .map(|(host, samples)| (host.as_str(), samples.as_slice()))
    }

    /// Number of hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl FromIterator<Sample> for HostSeries {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let mut series = HostSeries::new();
        for sample in iter {
            series.push(sample);
        }
        series
    }
}

impl IntoIterator for HostSeries {
    type Item = (String, Vec<Sample>);
    type IntoIter = std::vec::IntoIter<(String, Vec<Sample>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.into_iter()
    }
}

/// ホストごとに分割する（重複除去やフィールド名の検証はしない）
pub fn group_by_host<I>(samples: I) -> HostSeries
where
    I: IntoIterator<Item = Sample>,
{
    samples.into_iter().collect()
}

#[cfg(test)]
mod tests;
