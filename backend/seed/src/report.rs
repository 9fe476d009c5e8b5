use anyhow::Error;
use catalog::SiteData;
use favicon::{Classification, ImageLoader, Resolution, Resolver};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconReport {
    pub site: String,
    pub outcome: Resolution,
}

impl IconReport {
    pub fn winner(&self) -> String {
        match &self.outcome {
            Resolution::Icon { candidate, .. } => candidate.source.to_string(),
            Resolution::Glyph { glyph, .. } => format!("glyph {glyph}"),
        }
    }

    pub fn failures(&self) -> usize {
        match self.outcome {
            Resolution::Icon { failures, .. } | Resolution::Glyph { failures, .. } => failures,
        }
    }
}

/// Resolves every site in catalog order.
pub async fn audit_icons<L: ImageLoader + Sync>(
    data: &SiteData,
    resolver: &Resolver<L>,
    classification: Classification,
    show_progress: bool,
) -> Result<Vec<IconReport>, Error> {
    let total = data.sites().count() as u64;
    let pb = if show_progress {
        ProgressBar::new(total)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut reports = Vec::with_capacity(total as usize);

    for site in data.sites() {
        pb.set_message(format!("Resolving {}", site.name));

        let outcome = resolver
            .resolve_site(&site.url, site.explicit_icon(), &site.icon, classification)
            .await;

        reports.push(IconReport {
            site: site.name.clone(),
            outcome,
        });
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(reports)
}

pub fn print_report(reports: &[IconReport]) {
    for report in reports {
        println!(
            "{:<24} {:<12} ({} failed)",
            report.site,
            report.winner(),
            report.failures()
        );
    }

    let glyphs = reports
        .iter()
        .filter(|report| matches!(report.outcome, Resolution::Glyph { .. }))
        .count();

    println!(
        "\n{} sites: {} icons, {} glyphs",
        reports.len(),
        reports.len() - glyphs,
        glyphs
    );
}
