use crate::models::SiteData;

/// Keeps the sites whose name, description or domain contains `query`,
/// ignoring case. Categories with nothing left are dropped; friend links are
/// always kept.
pub fn filter(data: &SiteData, query: &str) -> SiteData {
    let query = query.trim().to_lowercase();

    if query.is_empty() {
        return data.clone();
    }

    let categories = data
        .categories
        .iter()
        .filter_map(|category| {
            let sites: Vec<_> = category
                .sites
                .iter()
                .filter(|site| {
                    site.name.to_lowercase().contains(&query)
                        || site.desc.to_lowercase().contains(&query)
                        || site.domain.to_lowercase().contains(&query)
                })
                .cloned()
                .collect();

            (!sites.is_empty()).then(|| {
                let mut category = category.clone();
                category.sites = sites;
                category
            })
        })
        .collect();

    SiteData {
        categories,
        friend_links: data.friend_links.clone(),
    }
}
