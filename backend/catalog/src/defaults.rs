//! Built-in document served when the KV store is empty or unavailable.

use crate::models::{Category, Site, SiteData};

const CLASH_ICON: &str =
    "https://raw.githubusercontent.com/clash-verge-rev/clash-verge-rev/dev/src-tauri/icons/icon.png";

const CATEGORIES: [(&str, &str); 5] = [
    ("common", "常用工具"),
    ("tier1", "一线机场"),
    ("tier2", "二线机场"),
    ("stable", "稳定老牌"),
    ("budget", "性价比"),
];

impl Default for SiteData {
    fn default() -> Self {
        let categories = CATEGORIES
            .iter()
            .map(|(id, title)| Category {
                id: id.to_string(),
                title: title.to_string(),
                sites: if *id == "common" { common_sites() } else { Vec::new() },
            })
            .collect();

        Self {
            categories,
            friend_links: Vec::new(),
        }
    }
}

fn common_sites() -> Vec<Site> {
    vec![
        download(
            "clash-android",
            "安卓客户端",
            "https://download.client.clashnews.org/proxy-clients-latest/android/clashforandroid-latest.apk",
            "download.client.clashnews.org",
            "🔗",
            "bg-purple-100 dark:bg-purple-900/30",
        ),
        download(
            "clash-win安装包",
            "Windows版本",
            "https://ghproxy.com/https://github.com/clash-verge-rev/clash-verge-rev/releases/download/autobuild/Clash.Verge_2.4.5+autobuild.1220.5afe11e_x64-setup.exe",
            "ghproxy.com",
            "🔗",
            "bg-blue-100 dark:bg-blue-900/30",
        ),
        download(
            "clash-Linux安装包",
            "Linux 64位",
            "https://ghproxy.com/https://github.com/clash-verge-rev/clash-verge-rev/releases/download/autobuild/Clash.Verge_2.4.5+autobuild.1220.5afe11e_amd64.deb",
            "ghproxy.com",
            "⚡",
            "bg-yellow-100 dark:bg-yellow-900/30",
        ),
    ]
}

fn download(name: &str, desc: &str, url: &str, domain: &str, icon: &str, color: &str) -> Site {
    Site {
        name: name.to_string(),
        desc: desc.to_string(),
        url: url.to_string(),
        domain: domain.to_string(),
        icon: icon.to_string(),
        icon_url: Some(CLASH_ICON.to_string()),
        color: color.to_string(),
    }
}
