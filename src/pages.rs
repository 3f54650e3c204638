//! Server-rendered HTML for the marketing pages and the scanner dashboard.
use std::fmt::Write as _;

use v_htmlescape::escape;

use crate::history::format_timestamp;
use crate::scanner::ScanSession;
use crate::types::{ScanPhase, ScanResult};

pub const BRAND: &str = "ReconHub";
const GITHUB_URL: &str = "https://github.com";
const LINKEDIN_URL: &str = "https://www.linkedin.com/in/hayshan-kannan-ab00b0354";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Home,
    Dashboard,
    About,
}

pub struct Feature {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const FEATURES: &[Feature] = &[
    Feature {
        icon: "search",
        title: "Advanced Subdomain Discovery",
        description: "Leverage multiple data sources including SecurityTrails and AlienVault OTX for comprehensive subdomain enumeration.",
    },
    Feature {
        icon: "clock",
        title: "Real-time Status Checking",
        description: "Instantly check HTTP status codes for discovered subdomains to identify active endpoints.",
    },
    Feature {
        icon: "download",
        title: "Export to CSV",
        description: "Download your reconnaissance results in CSV format for further analysis and reporting.",
    },
    Feature {
        icon: "shield",
        title: "Open Source Security",
        description: "Fully transparent codebase hosted on GitHub. Audit the code and contribute to improvements.",
    },
    Feature {
        icon: "globe",
        title: "No Installation Required",
        description: "Web-based platform accessible from anywhere. No need to install tools or manage dependencies.",
    },
    Feature {
        icon: "users",
        title: "Built for the Community",
        description: "Designed by a cybersecurity enthusiast for fellow bug bounty hunters and security researchers.",
    },
];

const HIGHLIGHTS: [(&str, &str, &str); 3] = [
    ("zap", "Lightning Fast", "Get subdomain results in seconds with our optimized scanning engine"),
    ("shield", "Always Free", "Open-source and free forever. No limits, no hidden costs"),
    ("globe", "Comprehensive", "Multiple data sources for the most complete subdomain discovery"),
];

/// Link to the dashboard that starts a scan of `domain` on load.
pub fn dashboard_link(domain: &str) -> String {
    format!("/dashboard?domain={}", urlencoding::encode(domain.trim()))
}

/// Sidebar link: always restarts the scan, even if `domain` is mid-run.
pub fn history_link(domain: &str) -> String {
    format!("{}&rerun=1", dashboard_link(domain))
}

fn layout(title: &str, active: Nav, body: &str, scripts: &[&str]) -> String {
    let nav_item = |nav: Nav, href: &str, label: &str| {
        let class = if nav == active { " class=\"active\"" } else { "" };
        format!("<a href=\"{href}\"{class}>{label}</a>")
    };
    let links = format!(
        "{}\n{}\n{}\n<a href=\"{GITHUB_URL}\" target=\"_blank\" rel=\"noopener noreferrer\">GitHub</a>\n<a href=\"{LINKEDIN_URL}\" target=\"_blank\" rel=\"noopener noreferrer\">LinkedIn</a>",
        nav_item(Nav::Home, "/", "Home"),
        nav_item(Nav::Dashboard, "/dashboard", "Dashboard"),
        nav_item(Nav::About, "/about", "About"),
    );
    let mut script_tags = String::new();
    for src in scripts {
        let _ = writeln!(script_tags, "<script src=\"{src}\" defer></script>");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {BRAND}</title>
<link rel="stylesheet" href="/assets/style.css">
{script_tags}</head>
<body>
<header class="site-header">
<a class="brand" href="/"><span class="logo">R</span><span class="gradient-text">{BRAND}</span></a>
<nav class="desktop-nav">
{links}
</nav>
<details class="mobile-nav">
<summary aria-label="Toggle menu">Menu</summary>
<nav>
{links}
</nav>
</details>
</header>
{body}
{footer}
</body>
</html>
"#,
        title = escape(title),
        footer = render_footer(),
    )
}

fn render_footer() -> String {
    format!(
        r#"<footer class="site-footer">
<div class="footer-grid">
<div>
<p class="brand"><span class="logo">R</span><span class="gradient-text">{BRAND}</span></p>
<p class="muted">Free, open-source reconnaissance platform for bug bounty hunters and cybersecurity enthusiasts.</p>
</div>
<div>
<h3>Links</h3>
<a href="/">Home</a>
<a href="/dashboard">Dashboard</a>
<a href="/about">About</a>
</div>
<div>
<h3>Connect</h3>
<a href="{GITHUB_URL}" target="_blank" rel="noopener noreferrer">GitHub</a>
<a href="{LINKEDIN_URL}" target="_blank" rel="noopener noreferrer">LinkedIn</a>
</div>
</div>
<p class="made-with muted">Made with <span class="heart">&hearts;</span> by a passionate cybersecurity enthusiast</p>
</footer>"#
    )
}

fn render_hero() -> String {
    let mut cards = String::new();
    for (icon, title, text) in HIGHLIGHTS {
        let _ = writeln!(
            cards,
            "<div class=\"glass card\"><i class=\"icon icon-{icon}\"></i><h3>{title}</h3><p class=\"muted\">{text}</p></div>"
        );
    }
    format!(
        r#"<section class="hero">
<span class="pill">Open-Source &bull; Free Forever</span>
<h1><span class="gradient-text">{BRAND}</span><br><small>Open-Source Recon for Everyone</small></h1>
<p class="lead muted">Discover subdomains and check their status with our powerful reconnaissance platform. Built for bug bounty hunters and cybersecurity students.</p>
<form class="scan-form" action="/dashboard" method="get">
<input type="text" name="domain" placeholder="Enter domain (e.g., example.com)" required>
<button type="submit" class="primary">Scan Now &rarr;</button>
</form>
<div class="highlights">
{cards}</div>
</section>"#
    )
}

fn render_features() -> String {
    let mut items = String::new();
    for f in FEATURES {
        let _ = writeln!(
            items,
            "<div class=\"glass card feature\"><i class=\"icon icon-{}\"></i><h3>{}</h3><p class=\"muted\">{}</p></div>",
            f.icon, f.title, f.description
        );
    }
    format!(
        r#"<section class="features">
<h2>Why use <span class="gradient-text">{BRAND}?</span></h2>
<p class="muted">Everything you need for subdomain reconnaissance in one powerful, free platform</p>
<div class="feature-grid">
{items}</div>
<p class="pill">Trusted by security researchers worldwide</p>
</section>"#
    )
}

pub fn render_home() -> String {
    let body = format!("<main>\n{}\n{}\n</main>", render_hero(), render_features());
    layout("Open-Source Recon for Everyone", Nav::Home, &body, &[])
}

pub fn render_about() -> String {
    let body = format!(
        r#"<main class="about">
<h1>About <span class="gradient-text">{BRAND}</span></h1>
<p class="lead muted">Built by a passionate cybersecurity enthusiast for the global security community</p>
<section class="glass">
<h2>The story</h2>
<p>{BRAND} started with a simple curiosity about how things work under the hood. After hundreds of hands-on labs it became clear that many students and aspiring bug bounty hunters lack access to proper reconnaissance tools.</p>
<p>{BRAND} is a completely free, open-source platform that makes that first reconnaissance step available to everyone.</p>
</section>
<section class="glass">
<h2>Mission</h2>
<p>{BRAND} exists to bridge the gap between expensive commercial tools and the needs of students, researchers and independent hunters. Every feature is designed with simplicity and effectiveness in mind.</p>
<p>By keeping everything open-source and transparent, the community can audit, learn from and improve the platform.</p>
</section>
<section class="glass">
<h2>Get involved</h2>
<p>{BRAND} is open-source and community-driven. Whether you're a developer, security researcher or student, contributions are welcome.</p>
<p><a class="button" href="{GITHUB_URL}" target="_blank" rel="noopener noreferrer">Contribute on GitHub</a>
<a class="button" href="{LINKEDIN_URL}" target="_blank" rel="noopener noreferrer">Connect on LinkedIn</a></p>
</section>
</main>"#
    );
    layout("About", Nav::About, &body, &[])
}

fn render_history_sidebar(session: &ScanSession) -> String {
    let mut out = String::from(
        "<aside class=\"history\" id=\"history\">\n<h2><i class=\"icon icon-clock\"></i>Scan History</h2>\n",
    );
    if session.history().is_empty() {
        out.push_str("<p class=\"muted\">No scans yet</p>\n");
    }
    for item in session.history().iter() {
        let _ = writeln!(
            out,
            "<a class=\"glass card history-item\" id=\"scan-{id}\" href=\"{href}\"><strong>{domain}</strong><small>{count} subdomains found</small><small>{when}</small></a>",
            id = escape(&item.id),
            href = escape(&history_link(&item.domain)),
            domain = escape(&item.domain),
            count = item.subdomain_count,
            when = format_timestamp(item.timestamp),
        );
    }
    out.push_str("</aside>");
    out
}

fn render_result_row(r: &ScanResult) -> String {
    let kind = r.kind();
    format!(
        "<tr><td><code>{sub}</code></td><td><span class=\"badge {class}\">{status}</span></td><td class=\"muted\">{text}</td><td><button type=\"button\" class=\"ghost copy\" data-copy=\"{sub}\">Copy</button></td></tr>",
        sub = escape(&r.subdomain),
        class = kind.css_class(),
        status = r.status,
        text = escape(&r.status_text),
    )
}

/// The scanner page as of `session`'s current state.
pub fn render_dashboard(session: &ScanSession) -> String {
    let phase = session.phase();
    let scanning = phase == ScanPhase::Scanning;
    let domain = session.domain().unwrap_or_default();
    let disabled = if scanning { " disabled" } else { "" };

    let progress = if scanning {
        format!(
            r#"<div class="progress" id="progress"><div class="progress-label"><span>Scanning {domain}...</span><span id="progress-value">{pct}%</span></div><div class="bar"><div class="fill" style="width: {pct}%"></div></div></div>"#,
            domain = escape(domain),
            pct = session.progress(),
        )
    } else {
        String::new()
    };

    let results = session.results();
    let body_section = if !results.is_empty() {
        let mut rows = String::new();
        for r in results {
            rows.push_str(&render_result_row(r));
            rows.push('\n');
        }
        let exports = if session.is_complete() {
            "<div class=\"exports\"><a class=\"button export\" href=\"/api/export.csv\" data-toast=\"Results exported to CSV file\">Export CSV</a><a class=\"button export\" href=\"/api/report\" data-toast=\"Report generated\">Export Report</a></div>"
        } else {
            ""
        };
        format!(
            r#"<section class="results" id="results">
<div class="results-head"><h2>Results ({count} subdomains found)</h2>{exports}</div>
<table class="glass">
<thead><tr><th>Subdomain</th><th>Status</th><th>Status Text</th><th>Actions</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</section>"#,
            count = results.len(),
        )
    } else if !scanning {
        "<section class=\"empty\" id=\"results\"><h3>Ready to scan</h3><p class=\"muted\">Enter a domain name above to start discovering subdomains</p></section>".to_string()
    } else {
        "<section class=\"results\" id=\"results\"></section>".to_string()
    };

    let notice = session
        .notice()
        .map(|n| {
            format!(
                "<div class=\"toast\" role=\"status\"><strong>{}</strong><p>{}</p></div>",
                escape(&n.title),
                escape(&n.description)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<div class="dashboard">
{sidebar}
<main class="scanner" id="scanner" data-state="{state}">
<a class="ghost back" href="/">&larr; Back to Home</a>
<div class="glass panel">
<h1><span class="gradient-text">Subdomain Scanner</span></h1>
<p class="muted">Discover subdomains and check their HTTP status codes</p>
<form class="scan-form" id="scan-form" action="/dashboard" method="get">
<input type="text" name="domain" value="{domain}" placeholder="Enter domain (e.g., example.com)" required{disabled}>
<button type="submit" class="primary"{disabled}>{label}</button>
</form>
{progress}
{body_section}
</div>
</main>
</div>
{notice}"#,
        sidebar = render_history_sidebar(session),
        state = phase_name(phase),
        domain = escape(domain),
        label = if scanning { "Scanning..." } else { "Start Scan" },
    );
    layout("Dashboard", Nav::Dashboard, &body, &["/assets/dashboard.js"])
}

fn phase_name(phase: ScanPhase) -> &'static str {
    match phase {
        ScanPhase::Idle => "idle",
        ScanPhase::Scanning => "scanning",
        ScanPhase::Complete => "complete",
    }
}
