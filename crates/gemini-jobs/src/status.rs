use std::fmt;

/// Per-worker operation tally. A read that returned no data counts in
/// neither bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
    pub write_ops: u64,
    pub write_errors: u64,
    pub read_ops: u64,
    pub read_errors: u64,
}

impl Status {
    pub fn merge(&mut self, other: &Status) {
        self.write_ops += other.write_ops;
        self.write_errors += other.write_errors;
        self.read_ops += other.read_ops;
        self.read_errors += other.read_errors;
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "write ops: {}, write errors: {}, read ops: {}, read errors: {}",
            self.write_ops, self.write_errors, self.read_ops, self.read_errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_every_bucket() {
        let mut total = Status::default();
        total.merge(&Status {
            write_ops: 1,
            write_errors: 2,
            read_ops: 3,
            read_errors: 4,
        });
        total.merge(&Status {
            write_ops: 10,
            write_errors: 20,
            read_ops: 30,
            read_errors: 40,
        });
        assert_eq!(
            total,
            Status {
                write_ops: 11,
                write_errors: 22,
                read_ops: 33,
                read_errors: 44,
            }
        );
    }
}
