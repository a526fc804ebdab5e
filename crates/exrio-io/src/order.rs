//! Channel order normalization.
//!
//! EXR stores channels sorted by name, so `[R, G, B]` comes back as
//! `[B, G, R]`. Decode uses the order recorded at encode time when it is
//! consistent with the stored channels; otherwise it puts `R, G, B, A` first
//! and keeps the rest in storage order.

const RGBA: [&str; 4] = ["R", "G", "B", "A"];

/// Returns indices into `stored` in the order the caller should see.
///
/// The result is always a permutation of `0..stored.len()`.
pub(crate) fn restore<S: AsRef<str>>(stored: &[S], record: Option<&[String]>) -> Vec<usize> {
    if let Some(record) = record {
        if let Some(order) = from_record(stored, record) {
            return order;
        }
        tracing::warn!(
            recorded = ?record,
            stored = ?stored.iter().map(AsRef::as_ref).collect::<Vec<_>>(),
            "channel order record does not match stored channels, using RGBA-first order"
        );
    }
    rgba_first(stored)
}

fn from_record<S: AsRef<str>>(stored: &[S], record: &[String]) -> Option<Vec<usize>> {
    if record.len() != stored.len() {
        return None;
    }
    let mut used = vec![false; stored.len()];
    let mut order = Vec::with_capacity(stored.len());
    for name in record {
        let index = stored.iter().position(|s| s.as_ref() == name)?;
        if std::mem::replace(&mut used[index], true) {
            return None;
        }
        order.push(index);
    }
    Some(order)
}

fn rgba_first<S: AsRef<str>>(stored: &[S]) -> Vec<usize> {
    let position = |name: &str| stored.iter().position(|s| s.as_ref() == name);
    let mut order: Vec<usize> = RGBA.iter().filter_map(|name| position(*name)).collect();
    order.extend((0..stored.len()).filter(|i| !RGBA.contains(&stored[*i].as_ref())));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(stored: &[&str], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| stored[i].to_string()).collect()
    }

    #[test]
    fn test_record_wins() {
        let stored = ["B", "G", "R"];
        let record = vec!["R".to_string(), "G".into(), "B".into()];
        assert_eq!(restore(&stored, Some(record.as_slice())), vec![2, 1, 0]);

        let record = vec!["G".to_string(), "R".into(), "B".into()];
        assert_eq!(names(&stored, &restore(&stored, Some(record.as_slice()))), ["G", "R", "B"]);
    }

    #[test]
    fn test_rgba_fallback() {
        let stored = ["A", "B", "G", "R", "Z", "id"];
        assert_eq!(
            names(&stored, &restore(&stored, None)),
            ["R", "G", "B", "A", "Z", "id"]
        );

        let stored = ["diffuse.B", "diffuse.R", "depth"];
        assert_eq!(restore(&stored, None), vec![0, 1, 2]);
    }

    #[test]
    fn test_bad_record_falls_back() {
        let stored = ["B", "G", "R"];
        let short = vec!["R".to_string()];
        assert_eq!(restore(&stored, Some(short.as_slice())), vec![2, 1, 0]);

        let dup = vec!["R".to_string(), "R".into(), "B".into()];
        assert_eq!(restore(&stored, Some(dup.as_slice())), vec![2, 1, 0]);

        let unknown = vec!["X".to_string(), "G".into(), "B".into()];
        assert_eq!(restore(&stored, Some(unknown.as_slice())), vec![2, 1, 0]);
    }
}
