//! Splice reconciliation
//!
//! Computes a short edit sequence that turns a container's current child list
//! into a desired one, and applies it through a [`SpliceTarget`]. Items are
//! compared by identity.
//!
//! The edit sequence is derived from a Levenshtein-style distance matrix over
//! the lists after trimming their shared prefix and suffix. Substitutions are
//! expressed as a removal plus an insertion at the same position.

/// One edit: at `index` (a position in the desired list), `removed` items are
/// taken out of the current list and `added` items are inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice<T> {
    pub index: usize,
    pub removed: Vec<T>,
    pub added: Vec<T>,
}

impl<T> Splice<T> {
    fn at(index: usize) -> Self {
        Self {
            index,
            removed: Vec::new(),
            added: Vec::new(),
        }
    }

    /// Number of items inserted by this splice
    pub fn added_count(&self) -> usize {
        self.added.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Leave,
    Update,
    Add,
    Delete,
}

/// Compute the splices turning `current` into `desired`.
///
/// Returns an empty sequence when the lists are identical.
pub fn calculate_splices<T: Copy + PartialEq>(desired: &[T], current: &[T]) -> Vec<Splice<T>> {
    let min_len = desired.len().min(current.len());
    let prefix = desired
        .iter()
        .zip(current)
        .take_while(|(d, c)| d == c)
        .count();
    let suffix = desired[prefix..]
        .iter()
        .rev()
        .zip(current[prefix..].iter().rev())
        .take(min_len - prefix)
        .take_while(|(d, c)| d == c)
        .count();

    let desired_mid = &desired[prefix..desired.len() - suffix];
    let current_mid = &current[prefix..current.len() - suffix];

    if desired_mid.is_empty() && current_mid.is_empty() {
        return Vec::new();
    }
    if desired_mid.is_empty() || current_mid.is_empty() {
        return vec![Splice {
            index: prefix,
            removed: current_mid.to_vec(),
            added: desired_mid.to_vec(),
        }];
    }

    let edits = edits_from_distances(&edit_distances(desired_mid, current_mid));
    let mut splices = Vec::new();
    let mut open: Option<Splice<T>> = None;
    let mut index = prefix;
    let mut old_index = prefix;

    for edit in edits {
        match edit {
            Edit::Leave => {
                if let Some(splice) = open.take() {
                    splices.push(splice);
                }
                index += 1;
                old_index += 1;
            }
            Edit::Update => {
                let splice = open.get_or_insert_with(|| Splice::at(index));
                splice.added.push(desired[index]);
                splice.removed.push(current[old_index]);
                index += 1;
                old_index += 1;
            }
            Edit::Add => {
                let splice = open.get_or_insert_with(|| Splice::at(index));
                splice.added.push(desired[index]);
                index += 1;
            }
            Edit::Delete => {
                let splice = open.get_or_insert_with(|| Splice::at(index));
                splice.removed.push(current[old_index]);
                old_index += 1;
            }
        }
    }
    if let Some(splice) = open {
        splices.push(splice);
    }
    splices
}

/// Distance matrix: rows walk `current`, columns walk `desired`.
fn edit_distances<T: PartialEq>(desired: &[T], current: &[T]) -> Vec<Vec<usize>> {
    let rows = current.len() + 1;
    let cols = desired.len() + 1;
    let mut distances = vec![vec![0; cols]; rows];
    for (i, row) in distances.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in distances[0].iter_mut().enumerate() {
        *cell = j;
    }
    for i in 1..rows {
        for j in 1..cols {
            distances[i][j] = if desired[j - 1] == current[i - 1] {
                distances[i - 1][j - 1]
            } else {
                distances[i - 1][j].min(distances[i][j - 1]) + 1
            };
        }
    }
    distances
}

fn edits_from_distances(distances: &[Vec<usize>]) -> Vec<Edit> {
    let mut i = distances.len() - 1;
    let mut j = distances[0].len() - 1;
    let mut current = distances[i][j];
    let mut edits = Vec::with_capacity(i + j);

    while i > 0 || j > 0 {
        if i == 0 {
            edits.push(Edit::Add);
            j -= 1;
            continue;
        }
        if j == 0 {
            edits.push(Edit::Delete);
            i -= 1;
            continue;
        }
        let diagonal = distances[i - 1][j - 1];
        let delete = distances[i - 1][j];
        let add = distances[i][j - 1];
        let min = if delete < add {
            delete.min(diagonal)
        } else {
            add.min(diagonal)
        };

        if min == diagonal {
            if diagonal == current {
                edits.push(Edit::Leave);
            } else {
                edits.push(Edit::Update);
                current = diagonal;
            }
            i -= 1;
            j -= 1;
        } else if min == delete {
            edits.push(Edit::Delete);
            i -= 1;
            current = delete;
        } else {
            edits.push(Edit::Add);
            j -= 1;
            current = add;
        }
    }
    edits.reverse();
    edits
}

/// Receiver of reconciliation operations
pub trait SpliceTarget<T> {
    /// Remove `item` from the container
    fn remove(&mut self, item: T);
    /// Insert `item` before `before`, or append when `None`
    fn insert_before(&mut self, item: T, before: Option<T>);
}

/// Apply `splices` to `target`, keeping `current` in step with it.
///
/// All removals run first, then all insertions. Removal positions are shifted
/// back by the items earlier splices will add; insertions go before whatever
/// sits at the splice index once removals are done.
pub fn apply_splices<T, S>(target: &mut S, current: &mut Vec<T>, splices: &[Splice<T>])
where
    T: Copy + PartialEq,
    S: SpliceTarget<T>,
{
    let mut added_before = 0;
    for splice in splices {
        let at = splice.index - added_before;
        for &item in &splice.removed {
            debug_assert!(current.get(at) == Some(&item));
            target.remove(item);
            current.remove(at);
        }
        added_before += splice.added_count();
    }
    for splice in splices {
        let before = current.get(splice.index).copied();
        for (offset, &item) in splice.added.iter().enumerate() {
            target.insert_before(item, before);
            current.insert(splice.index + offset, item);
        }
    }
}
