// Plain-text agenda rendering

use std::fmt::Write;

use chrono::NaiveDate;

use task_calendar::models::task::{Priority, Task};
use task_calendar::services::notice::Notice;
use task_calendar::services::scheduling::PlacementIndex;
use task_calendar::utils::date::{week_range_label, CalendarDay};

pub fn task_line(task: &Task) -> String {
    let mut line = format!("[{}] {}", task.id, task.title);
    if task.priority != Priority::P4 {
        let _ = write!(line, " ({})", task.priority.label());
    }
    if !task.labels.is_empty() {
        let _ = write!(line, " #{}", task.labels.join(" #"));
    }
    line
}

fn render_day(out: &mut String, placements: &PlacementIndex, day: &CalendarDay) -> bool {
    let mut slots = placements.on_date(day.date).peekable();
    if slots.peek().is_none() {
        return false;
    }

    let marker = if day.is_today { " (today)" } else { "" };
    let _ = writeln!(
        out,
        "{} {}{}",
        day.short_day_name,
        day.date.format("%b %-d"),
        marker
    );
    for (key, tasks) in slots {
        for task in tasks {
            let _ = writeln!(out, "  {:>8}  {}", key.time.label(), task_line(task));
        }
    }
    true
}

pub fn week(placements: &PlacementIndex, days: &[CalendarDay]) -> String {
    let mut out = format!("Week of {}\n", week_range_label(days));
    let mut any = false;
    for day in days {
        any |= render_day(&mut out, placements, day);
    }
    if !any {
        out.push_str("  Nothing scheduled this week.\n");
    }
    out
}

pub fn month(placements: &PlacementIndex, days: &[CalendarDay], reference: NaiveDate) -> String {
    let mut out = format!("{}\n", reference.format("%B %Y"));
    let mut any = false;
    for day in days.iter().filter(|day| day.in_month) {
        any |= render_day(&mut out, placements, day);
    }
    if !any {
        out.push_str("  Nothing scheduled this month.\n");
    }
    out
}

pub fn unplaced(tasks: &[&Task]) -> String {
    if tasks.is_empty() {
        return "No unscheduled tasks.\n".to_string();
    }
    let mut out = format!("Unscheduled ({})\n", tasks.len());
    for task in tasks {
        let _ = writeln!(out, "  {}", task_line(task));
    }
    out
}

pub fn notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|notice| format!("{} {}\n", notice.level.icon(), notice.message))
        .collect()
}
