//! Set algebra over sorted, duplicate-free document id lists.

/// Ids present in both `a` and `b`.
pub fn intersect(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Ids present in `a` or `b`, each once.
pub fn union(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Ids in `[0, n_docs)` that are not in `a`.
pub fn complement(a: &[u32], n_docs: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity((n_docs as usize).saturating_sub(a.len()));
    let mut excluded = a.iter().copied().peekable();
    for doc in 0..n_docs {
        while excluded.next_if(|&id| id < doc).is_some() {}
        if excluded.next_if_eq(&doc).is_none() {
            out.push(doc);
        }
    }
    out
}
