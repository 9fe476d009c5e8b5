//! Server-rendered navigation page.
//!
//! Each card's icon is emitted as an `<img>` starting at the first candidate
//! with the rest in `data-fallbacks`, followed by a hidden glyph. The inline
//! script advances through the fallbacks on error, on loads smaller than 2px
//! and on loads that do not settle in time, then reveals the glyph.

use std::time::Duration;

use askama::Template;
use catalog::{Category, FriendLink, Site, SiteData};
use favicon::{Classification, IconMarkup};

use crate::error::AppError;

struct CardView<'a> {
    site: &'a Site,
    icon: IconMarkup,
}

struct SectionView<'a> {
    category: &'a Category,
    cards: Vec<CardView<'a>>,
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r##"<!DOCTYPE html>
<html lang="zh-CN">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <meta name="theme-color" content="#8b5cf6" />
    <title>导航</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    <script>
      (function () {
        function timeoutMs() {
          var value = parseInt(document.body.getAttribute("data-icon-timeout") || "4000", 10);
          return isNaN(value) ? 4000 : value;
        }

        function arm(img) {
          clearTimeout(img._iconTimer);
          img._iconTimer = setTimeout(function () {
            if (!img.complete || img.naturalWidth === 0) {
              window.handleIconError(img);
            }
          }, timeoutMs());
        }

        window.handleIconError = function (img) {
          clearTimeout(img._iconTimer);
          var fallbacks = [];
          try {
            fallbacks = JSON.parse(img.getAttribute("data-fallbacks") || "[]");
          } catch (e) {
            fallbacks = [];
          }
          var index = parseInt(img.getAttribute("data-fallback-index") || "0", 10);
          if (index < fallbacks.length) {
            img.setAttribute("data-fallback-index", String(index + 1));
            img.src = fallbacks[index];
            arm(img);
            return;
          }
          img.style.display = "none";
          var glyph = img.nextElementSibling;
          if (glyph && glyph.classList.contains("favicon-emoji")) {
            glyph.style.display = "inline";
          }
        };

        window.handleIconLoad = function (img) {
          clearTimeout(img._iconTimer);
          if (img.naturalWidth < 2 || img.naturalHeight < 2) {
            window.handleIconError(img);
          }
        };

        document.addEventListener("DOMContentLoaded", function () {
          document.querySelectorAll("img.favicon-smart").forEach(function (img) {
            if (!img.complete) {
              arm(img);
            }
          });
        });
      })();
    </script>
  </head>
  <body class="bg-slate-50 text-slate-900" data-icon-timeout="{{ icon_timeout_ms }}" data-network="{{ classification }}">
    <main class="max-w-6xl mx-auto px-4 py-10 space-y-10">
      <form method="get" action="/" class="flex gap-2">
        <input id="searchInput" type="search" name="q" value="{{ query }}" placeholder="搜索" class="flex-1 rounded-xl border border-slate-200 px-4 py-2" />
      </form>

      {% for section in sections %}
      <section id="{{ section.category.id }}">
        <h2 class="text-xl font-bold mb-4">{{ section.category.title }}</h2>
        <div id="{{ section.category.id }}-cards" class="grid gap-4 sm:grid-cols-2 lg:grid-cols-3">
          {% for card in section.cards %}
          <a href="{{ card.site.url }}" target="_blank" rel="noopener noreferrer"
             class="site-card block p-4 rounded-2xl bg-white/70 border border-slate-200/70 hover:bg-white"
             data-name="{{ card.site.name }}" data-desc="{{ card.site.desc }}" data-domain="{{ card.site.domain }}">
            <div class="flex items-start gap-3">
              <div class="icon-container {{ card.site.color }}">
                {% if card.icon.is_image() %}
                <img src="{{ card.icon.primary() }}" alt="{{ card.site.name }}" title="{{ card.site.name }}"
                     class="w-6 h-6 rounded favicon-smart" decoding="async" width="24" height="24"
                     data-fallbacks="{{ card.icon.fallbacks_json() }}" data-fallback-index="0"
                     onerror="handleIconError(this)" onload="handleIconLoad(this)">
                <span class="text-2xl favicon-emoji" style="display:none" aria-hidden="true">{{ card.icon.glyph() }}</span>
                {% else %}
                <span class="text-2xl" role="img" aria-label="{{ card.site.name }}">{{ card.icon.glyph() }}</span>
                {% endif %}
              </div>
              <div class="flex-1 min-w-0">
                <h3 class="font-semibold truncate">{{ card.site.name }}</h3>
                <p class="text-sm text-slate-600 mt-1 line-clamp-2">{{ card.site.desc }}</p>
                <p class="text-xs text-slate-400 mt-2">{{ card.site.domain }}</p>
              </div>
            </div>
          </a>
          {% endfor %}
        </div>
      </section>
      {% endfor %}

      {% if !friend_links.is_empty() %}
      <section id="links">
        <h2 class="text-xl font-bold mb-4">友情链接</h2>
        <div id="friend-links" class="flex flex-wrap gap-3">
          {% for link in friend_links %}
          <a href="{{ link.url }}" target="_blank" rel="noopener noreferrer"
             class="friend-link px-4 py-2 rounded-xl bg-white/50 border border-slate-200/50 text-sm" data-name="{{ link.name }}">{{ link.name }}</a>
          {% endfor %}
        </div>
      </section>
      {% endif %}
    </main>
  </body>
</html>
"##
)]
struct PageTemplate<'a> {
    sections: Vec<SectionView<'a>>,
    friend_links: &'a [FriendLink],
    query: &'a str,
    classification: Classification,
    icon_timeout_ms: u128,
}

/// Renders one section per non-empty category.
pub fn render_page(
    data: &SiteData,
    query: &str,
    classification: Classification,
    icon_timeout: Duration,
) -> Result<String, AppError> {
    let sections = data
        .categories
        .iter()
        .filter(|category| !category.sites.is_empty())
        .map(|category| SectionView {
            category,
            cards: category
                .sites
                .iter()
                .map(|site| CardView {
                    site,
                    icon: site.icon_markup(classification),
                })
                .collect(),
        })
        .collect();

    let template = PageTemplate {
        sections,
        friend_links: &data.friend_links,
        query,
        classification,
        icon_timeout_ms: icon_timeout.as_millis(),
    };

    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use catalog::{Category, FriendLink, Site, SiteData};

    use super::*;

    fn data() -> SiteData {
        let mut with_icon = Site::new("ouo", "https://login.ouonetwork.com/register?i=recycOhA");
        with_icon.icon = "🚀".to_string();
        with_icon.icon_url = Some("https://login.ouonetwork.com/favicon.ico".to_string());

        let mut broken = Site::new("broken <b>", "not a url");
        broken.icon = "🧱".to_string();

        SiteData {
            categories: vec![
                Category {
                    id: "tier1".to_string(),
                    title: "Tier 1".to_string(),
                    sites: vec![with_icon, broken],
                },
                Category {
                    id: "budget".to_string(),
                    title: "Budget".to_string(),
                    sites: Vec::new(),
                },
            ],
            friend_links: vec![FriendLink {
                name: "GitHub".to_string(),
                url: "https://github.com/".to_string(),
            }],
        }
    }

    /// Undoes attribute escaping so assertions read like the browser sees it.
    fn unescape(html: &str) -> String {
        html.replace("&#x2f;", "/")
            .replace("&#47;", "/")
            .replace("&quot;", "\"")
            .replace("&#34;", "\"")
            .replace("&#x27;", "'")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }

    fn render(classification: Classification) -> String {
        unescape(&render_page(&data(), "", classification, Duration::from_millis(4000)).unwrap())
    }

    #[test]
    fn explicit_icon_is_the_first_source() {
        let html = render(Classification::Open);

        assert!(html.contains(r#"src="https://login.ouonetwork.com/favicon.ico""#));
        assert!(html.contains("data-fallbacks="));
        assert!(html.contains("favicon-emoji"));
        assert!(html.contains("🚀"));
    }

    #[test]
    fn invalid_url_renders_glyph_without_image() {
        let html = render(Classification::Open);

        assert!(html.contains(r#"aria-label="broken &lt;b&gt;">🧱</span>"#));
        assert!(!html.contains("broken <b>"));
        assert_eq!(html.matches("rounded favicon-smart\"").count(), 1);
    }

    #[test]
    fn empty_categories_are_skipped() {
        let html = render(Classification::Restricted);

        assert!(html.contains(r#"<section id="tier1">"#));
        assert!(!html.contains(r#"<section id="budget">"#));
        assert!(html.contains(r#"<section id="links">"#));
        assert!(html.contains(r#"data-network="restricted""#));
        assert!(html.contains(r#"data-icon-timeout="4000""#));
    }

    #[test]
    fn fallback_order_follows_classification() {
        let open = render(Classification::Open);
        let restricted = render(Classification::Restricted);

        let google = "www.google.com/s2/favicons?domain=login.ouonetwork.com";
        let bqb = "icon.bqb.cool?url=";

        assert!(open.find(google).unwrap() < open.find(bqb).unwrap());
        assert!(restricted.find(bqb).unwrap() < restricted.find(google).unwrap());
    }

    #[test]
    fn icons_load_eagerly_under_the_timer() {
        let html = render(Classification::Open);

        // a deferred image would run out its timer without ever loading
        assert!(!html.contains("loading=\"lazy\""));
        assert!(html.contains("if (!img.complete)"));
    }

    #[test]
    fn theme_color_survives_rendering() {
        let html = render(Classification::Open);

        assert!(html.contains(r##"content="#8b5cf6""##));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
