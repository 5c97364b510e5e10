//! Analysis prompt construction

use taskhub_types::{Todo, TodoStats, TodoStatus};

/// Returned without calling the provider when there is nothing to analyze
pub const EMPTY_HISTORY_MESSAGE: &str =
    "You have no todo history yet, so there is nothing to analyze. \
     Add a few todos and come back for your report.";

/// How many recent todos are quoted verbatim in the prompt
const SAMPLE_SIZE: usize = 20;

/// Build the analysis prompt from a user's history and statistics
pub fn build_analysis_prompt(todos: &[Todo], stats: &TodoStats) -> String {
    let sample: String = todos
        .iter()
        .take(SAMPLE_SIZE)
        .map(|t| {
            format!(
                "- [{}][{}{}] {}\n",
                t.status, t.importance, t.urgency, t.title
            )
        })
        .collect();

    let data = format!(
        "Todo history data:\n\n\
         [Totals]\n\
         - total: {total}\n\
         - completed: {completed} ({rate}%)\n\
         - in progress: {in_progress}\n\
         - pending: {pending}\n\
         - cancelled: {cancelled}\n\n\
         [Importance distribution]\n\
         - A (most important): {a}\n\
         - B (important): {b}\n\
         - C (normal): {c}\n\
         - D (minor): {d}\n\n\
         [Urgency distribution]\n\
         - 1 (most urgent): {u1}\n\
         - 2: {u2}\n\
         - 3: {u3}\n\
         - 4: {u4}\n\
         - 5 (can wait): {u5}\n\n\
         [Recent todos]\n{sample}",
        total = stats.total,
        completed = stats.completed,
        rate = stats.completion_rate,
        in_progress = stats.in_progress,
        pending = stats.pending,
        cancelled = stats.cancelled,
        a = stats.by_importance.a,
        b = stats.by_importance.b,
        c = stats.by_importance.c,
        d = stats.by_importance.d,
        u1 = stats.by_urgency[0],
        u2 = stats.by_urgency[1],
        u3 = stats.by_urgency[2],
        u4 = stats.by_urgency[3],
        u5 = stats.by_urgency[4],
    );

    format!(
        "You are a professional time-management and planning coach. \
         Analyze the following todo history and give personalized advice.\n\n\
         {data}\n\
         Cover these angles:\n\n\
         1. **Completion assessment**: judge overall execution from the completion rate.\n\
         2. **Priority management**: from the importance/urgency distribution, is effort \
         going to the right quadrants? Call out urgent-but-unimportant overload.\n\
         3. **Habit insights**: what working habits does the data suggest?\n\
         4. **Eisenhower matrix advice**: concrete quadrant-based suggestions.\n\
         5. **Action plan**: three to five specific, actionable improvements.\n\n\
         Reply in a friendly, professional tone, in Markdown, under 800 words."
    )
}

/// Whether the history warrants calling the provider at all
pub fn has_analyzable_history(todos: &[Todo]) -> bool {
    !todos.is_empty()
}

/// Completed/open split used by callers that want a quick summary line
pub fn open_todo_count(todos: &[Todo]) -> usize {
    todos
        .iter()
        .filter(|t| matches!(t.status, TodoStatus::Pending | TodoStatus::InProgress))
        .count()
}
