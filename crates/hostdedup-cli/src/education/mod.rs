//! Educational features: explanations of each pipeline stage.
//!
//! Explanations go to stderr so they never mix with machine-readable output.

use colored::Colorize;

/// Command explanation builder.
pub struct Explain {
    title: String,
    description: String,
    settings: Vec<(String, String)>,
    what_happens: Vec<String>,
}

impl Explain {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            settings: Vec::new(),
            what_happens: Vec::new(),
        }
    }

    fn description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    fn setting(mut self, name: &str, value: impl ToString) -> Self {
        self.settings.push((name.to_string(), value.to_string()));
        self
    }

    fn step(mut self, step: &str) -> Self {
        self.what_happens.push(step.to_string());
        self
    }

    /// Print the explanation to stderr.
    pub fn print(&self) {
        eprintln!();
        eprintln!("{} {}", "=== What This Does ===".bold().cyan(), self.title.bold());
        eprintln!("{}", self.description);
        eprintln!();

        if !self.what_happens.is_empty() {
            eprintln!("{}", "How it works:".bold());
            for (i, step) in self.what_happens.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, step);
            }
            eprintln!();
        }

        for (name, value) in &self.settings {
            eprintln!("{} {}", format!("{name}:").bold(), value.dimmed());
        }

        eprintln!();
        eprintln!("{}", "=== Results ===".bold().cyan());
        eprintln!();
    }

    // ========================================================================
    // Factory methods for each command
    // ========================================================================

    pub fn dedup(threshold: f64, metric: impl ToString, blocking: bool) -> Self {
        Self::new("Deduplicate")
            .description(
                "Merges host records from several scanners into one record per physical machine.",
            )
            .step("Each source export is mapped onto the unified host model")
            .step("Hostnames are lowercased and stripped of their domain suffix")
            .step("IPs that are not dotted quads and malformed MACs are dropped")
            .step("Records are compared in order against existing clusters")
            .step("Score = mean of IP overlap, MAC overlap, hostname similarity, OS match")
            .step("The first cluster at or above the threshold absorbs the record")
            .step("Merging unions addresses, widens the seen window, keeps the max vuln count")
            .setting("Threshold", threshold)
            .setting("Hostname metric", metric)
            .setting(
                "Candidates",
                if blocking {
                    "clusters sharing an IP or MAC"
                } else {
                    "every cluster"
                },
            )
    }

    pub fn score(threshold: f64) -> Self {
        Self::new("Score")
            .description("Shows how similar each pair of host records is, signal by signal.")
            .step("IP and MAC: shared addresses over the size of the larger set")
            .step("Hostname: string similarity of the normalized names")
            .step("OS: 1.0 when name and version match ignoring case, else 0.0")
            .step("Total: weighted mean of the four signals")
            .setting("Threshold", threshold)
    }

    pub fn normalize(kind: &str) -> Self {
        let explanation = Self::new("Normalize")
            .description("Shows the canonical form used when comparing records.");

        match kind {
            "hostname" => explanation
                .step("Lowercase")
                .step("Keep everything before the first '.'"),
            "ip" => explanation
                .step("Trim whitespace")
                .step("Keep only four dot-separated groups of 1-3 digits")
                .step("Octet values are not range-checked"),
            _ => explanation
                .step("Lowercase and drop ':', '-' and '.' separators")
                .step("Require exactly 12 hex digits")
                .step("Rejoin as colon-separated pairs"),
        }
    }
}
