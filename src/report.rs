use std::io::{self, Write};

use itertools::Itertools;

use crate::stats::Activity;

pub fn write_users(out: &mut impl Write, activity: &Activity) -> io::Result<()> {
    writeln!(out, "Name                 PRs   Approved  Commented     Change  Dismissed")?;
    writeln!(out, "----                 ---   --------  ---------     ------  ---------")?;
    for (name, stat) in activity.users().sorted_by_key(|(name, _)| *name) {
        writeln!(
            out,
            "{:<20} {:<3} {:<10} {:<10} {:<10} {:<10}",
            name, stat.authored, stat.approved, stat.commented, stat.changes_requested, stat.dismissed
        )?;
    }
    Ok(())
}

/// Sorted by the blocked author only; rows for the same author stay in the
/// order they were first seen.
pub fn write_blocked(out: &mut impl Write, activity: &Activity) -> io::Result<()> {
    writeln!(out, "Blocked by   Raised by       Count")?;
    writeln!(out, "----------   ---------       -----")?;
    for (blocked, blocking, count) in activity.blocked().sorted_by_key(|(blocked, _, _)| *blocked) {
        writeln!(out, "{:<12} {:<12} {:<5}", blocked, blocking, count)?;
    }
    Ok(())
}

pub fn write_report(out: &mut impl Write, activity: &Activity) -> io::Result<()> {
    write_users(out, activity)?;
    writeln!(out)?;
    write_blocked(out, activity)
}
