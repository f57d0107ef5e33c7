use hashbrown::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GsOp {
    Add,
    Min,
    Max,
}

/// Reduction pattern built once from global ids and reused every call.
///
/// Only ids held by more than one entry form a group; negative ids are not
/// gathered.
#[derive(Clone, Debug)]
pub struct GatherScatter {
    nentries: usize,
    groups: Vec<Vec<usize>>,
}

impl GatherScatter {
    pub fn setup(global_ids: &[i64], verbose: bool) -> Self {
        let mut by_id: HashMap<i64, Vec<usize>> = HashMap::new();
        for (i, &id) in global_ids.iter().enumerate() {
            if id >= 0 {
                by_id.entry(id).or_default().push(i);
            }
        }
        let mut groups: Vec<Vec<usize>> = by_id
            .into_values()
            .filter(|group| group.len() > 1)
            .collect();
        groups.sort_unstable_by_key(|group| group[0]);
        if verbose {
            log::info!(
                "gather-scatter: {} entries, {} shared groups",
                global_ids.len(),
                groups.len()
            );
        }
        Self {
            nentries: global_ids.len(),
            groups,
        }
    }
    pub fn nentries(&self) -> usize {
        self.nentries
    }
    /// In-place reduction of `buf`, laid out as `nfields` values per entry.
    pub fn gather_scatter(&self, buf: &mut [f64], nfields: usize, op: GsOp) {
        debug_assert_eq!(buf.len(), self.nentries * nfields);
        for group in &self.groups {
            for fld in 0..nfields {
                let values = group.iter().map(|&i| buf[i * nfields + fld]);
                let reduced: f64 = match op {
                    GsOp::Add => values.sum(),
                    GsOp::Min => values.fold(f64::INFINITY, f64::min),
                    GsOp::Max => values.fold(f64::NEG_INFINITY, f64::max),
                };
                for &i in group {
                    buf[i * nfields + fld] = reduced;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_multiplicity() {
        let gs = GatherScatter::setup(&[0, 1, 2, 0, 2, 3], false);
        let mut ones = vec![1.0; 6];
        gs.gather_scatter(&mut ones, 1, GsOp::Add);
        assert_eq!(ones, vec![2.0, 1.0, 2.0, 2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_multiple_fields_and_max() {
        let gs = GatherScatter::setup(&[5, 5, -1], false);
        let mut buf = vec![1.0, 10.0, 3.0, 20.0, 7.0, 7.0];
        gs.gather_scatter(&mut buf, 2, GsOp::Max);
        assert_eq!(buf, vec![3.0, 20.0, 3.0, 20.0, 7.0, 7.0]);
    }
}
