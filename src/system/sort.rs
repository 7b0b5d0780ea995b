use std::cmp::Ordering;

use super::process::ProcessSnapshot;
use crate::view::{Column, SortSpec};

/// Comparable value of one cell. Missing readings compare as `0.0` or the
/// empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey<'a> {
    Int(u32),
    Number(f64),
    Text(&'a str),
}

impl<'a> SortKey<'a> {
    pub fn of(row: &'a ProcessSnapshot, column: Column) -> Self {
        match column {
            Column::Pid => SortKey::Int(row.pid),
            Column::Name => SortKey::Text(row.name.as_deref().unwrap_or("")),
            Column::Path => SortKey::Text(row.path.as_deref().unwrap_or("")),
            Column::User => SortKey::Text(&row.user),
            Column::Cpu => SortKey::Number(row.cpu_percent.unwrap_or(0.0)),
            Column::Memory => SortKey::Number(row.mem_percent.unwrap_or(0.0)),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Int(a), SortKey::Int(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase)),
            // one column always yields one variant
            _ => Ordering::Equal,
        }
    }
}

/// Ordering of two rows under `sort`. Ties fall back to ascending pid so
/// the result is total and independent of input order.
pub fn compare_rows(a: &ProcessSnapshot, b: &ProcessSnapshot, sort: &SortSpec) -> Ordering {
    let primary = SortKey::of(a, sort.column).compare(&SortKey::of(b, sort.column));
    let primary = if sort.ascending {
        primary
    } else {
        primary.reverse()
    };
    primary.then_with(|| a.pid.cmp(&b.pid))
}

pub fn sort_rows(rows: &mut [ProcessSnapshot], sort: &SortSpec) {
    rows.sort_by(|a, b| compare_rows(a, b, sort));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(pid: u32, name: Option<&str>, cpu: Option<f64>) -> ProcessSnapshot {
        ProcessSnapshot {
            pid,
            name: name.map(str::to_string),
            path: None,
            user: "root".to_string(),
            cpu_percent: cpu,
            mem_percent: None,
        }
    }

    fn pids(rows: &[ProcessSnapshot]) -> Vec<u32> {
        rows.iter().map(|r| r.pid).collect()
    }

    #[test]
    fn cpu_descending_with_missing_as_zero() {
        let mut rows = vec![
            row(1, None, Some(0.5)),
            row(2, None, None),
            row(3, None, Some(12.0)),
            row(4, None, Some(0.0)),
        ];
        sort_rows(
            &mut rows,
            &SortSpec {
                column: Column::Cpu,
                ascending: false,
            },
        );
        assert_eq!(pids(&rows), vec![3, 1, 2, 4]);
    }

    #[test]
    fn names_compare_case_insensitively() {
        let mut rows = vec![
            row(1, Some("zsh"), None),
            row(2, Some("Bash"), None),
            row(3, Some("apache"), None),
            row(4, None, None),
        ];
        sort_rows(
            &mut rows,
            &SortSpec {
                column: Column::Name,
                ascending: true,
            },
        );
        assert_eq!(pids(&rows), vec![4, 3, 2, 1]);
    }

    #[test]
    fn ties_break_on_pid_in_both_directions() {
        let mut rows = vec![row(9, None, Some(1.0)), row(2, None, Some(1.0))];
        for ascending in [true, false] {
            sort_rows(
                &mut rows,
                &SortSpec {
                    column: Column::Cpu,
                    ascending,
                },
            );
            assert_eq!(pids(&rows), vec![2, 9]);
        }
    }

    fn arb_row() -> impl Strategy<Value = ProcessSnapshot> {
        (
            any::<u32>(),
            proptest::option::of("[a-zA-Z]{0,6}"),
            proptest::option::of(prop_oneof![
                Just(f64::NAN),
                Just(-0.0),
                0.0f64..100.0,
            ]),
        )
            .prop_map(|(pid, name, cpu)| ProcessSnapshot {
                pid,
                name,
                path: None,
                user: String::new(),
                cpu_percent: cpu,
                mem_percent: None,
            })
    }

    fn arb_sort() -> impl Strategy<Value = SortSpec> {
        (
            prop_oneof![Just(Column::Pid), Just(Column::Name), Just(Column::Cpu)],
            any::<bool>(),
        )
            .prop_map(|(column, ascending)| SortSpec { column, ascending })
    }

    proptest! {
        #[test]
        fn ordering_is_antisymmetric_and_transitive(
            a in arb_row(), b in arb_row(), c in arb_row(), sort in arb_sort()
        ) {
            prop_assert_eq!(compare_rows(&a, &b, &sort), compare_rows(&b, &a, &sort).reverse());
            if compare_rows(&a, &b, &sort) != Ordering::Greater
                && compare_rows(&b, &c, &sort) != Ordering::Greater
            {
                prop_assert_ne!(compare_rows(&a, &c, &sort), Ordering::Greater);
            }
        }

        #[test]
        fn sorting_is_independent_of_input_order(
            mut rows in proptest::collection::vec(arb_row(), 0..40),
            sort in arb_sort(),
        ) {
            let mut reversed = rows.clone();
            reversed.reverse();
            sort_rows(&mut rows, &sort);
            sort_rows(&mut reversed, &sort);
            prop_assert_eq!(pids(&rows), pids(&reversed));
        }
    }
}
