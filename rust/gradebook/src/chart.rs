use crate::calc::Histogram;

pub const X_LABEL: &str = "Score (%)";
pub const Y_LABEL: &str = "Number of Students";

/// Widest bar, in characters. Larger counts are scaled down to fit.
const MAX_BAR_WIDTH: usize = 40;

fn bin_label(edges: &[f64], idx: usize) -> String {
    let close = if idx + 2 == edges.len() { ']' } else { ')' };
    format!("[{}, {}{}", edges[idx], edges[idx + 1], close)
}

fn bar_len(count: usize, max_count: usize) -> usize {
    if max_count <= MAX_BAR_WIDTH {
        count
    } else {
        (count * MAX_BAR_WIDTH).div_ceil(max_count)
    }
}

/// Horizontal bar chart: one row per bin, bar length proportional to the count.
pub fn render_histogram(hist: &Histogram) -> String {
    let title = hist.title();
    let labels: Vec<String> = (0..hist.counts.len())
        .map(|i| bin_label(&hist.edges, i))
        .collect();
    let label_width = labels
        .iter()
        .map(|l| l.len())
        .max()
        .unwrap_or(0)
        .max(X_LABEL.len());
    let max_count = hist.counts.iter().copied().max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(&title);
    out.push('\n');
    out.push_str(&"=".repeat(title.chars().count()));
    out.push_str("\n\n");
    out.push_str(&format!("{:>width$}\n", X_LABEL, width = label_width));

    for (label, &count) in labels.iter().zip(hist.counts.iter()) {
        let bar = "#".repeat(bar_len(count, max_count));
        out.push_str(&format!(
            "{:>width$} |{} {}\n",
            label,
            bar,
            count,
            width = label_width
        ));
    }

    let axis_len = bar_len(max_count, max_count).max(Y_LABEL.len()) + 2;
    out.push_str(&format!(
        "{:>width$} +{}\n",
        "",
        "-".repeat(axis_len),
        width = label_width
    ));
    out.push_str(&format!(
        "{:>width$}  {}\n",
        "",
        Y_LABEL,
        width = label_width
    ));
    out
}
