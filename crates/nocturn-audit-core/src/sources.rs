// SPDX-License-Identifier: Apache-2.0

//! Raw text of the audited site's data and markup files.
//!
//! Every required source is read once up front; checks never touch the
//! filesystem themselves. The RSS feed and llms manifest are optional on
//! disk — their absence is a finding, not a load failure.

use std::path::Path;

use nocturn_audit_adapters::Fs;

use crate::profile::SiteProfile;

#[derive(Debug, Clone)]
pub struct SiteSources {
    pub venues: String,
    pub content: String,
    pub index_html: String,
    pub sitemap: String,
    pub robots: String,
    pub rss: Option<String>,
    pub llms: Option<String>,
    pub detail_page: String,
    pub home_page: String,
    pub region_page: String,
    pub venue_card: String,
    pub search_box: String,
    pub layout: String,
    pub app: String,
    pub slug_util: String,
}

fn read_required(fs: &dyn Fs, repo_root: &Path, path: &Path) -> Result<String, String> {
    fs.read_text(repo_root, path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))
}

fn read_optional(fs: &dyn Fs, repo_root: &Path, path: &Path) -> Option<String> {
    if fs.exists(repo_root, path) {
        fs.read_text(repo_root, path).ok()
    } else {
        None
    }
}

impl SiteSources {
    pub fn load(
        fs: &dyn Fs,
        repo_root: &Path,
        profile: &SiteProfile,
    ) -> Result<Self, String> {
        let paths = &profile.paths;
        Ok(Self {
            venues: read_required(fs, repo_root, &paths.venues)?,
            content: read_required(fs, repo_root, &paths.content)?,
            index_html: read_required(fs, repo_root, &paths.index_html)?,
            sitemap: read_required(fs, repo_root, &paths.sitemap)?,
            robots: read_required(fs, repo_root, &paths.robots)?,
            rss: read_optional(fs, repo_root, &paths.rss),
            llms: read_optional(fs, repo_root, &paths.llms),
            detail_page: read_required(fs, repo_root, &paths.detail_page)?,
            home_page: read_required(fs, repo_root, &paths.home_page)?,
            region_page: read_required(fs, repo_root, &paths.region_page)?,
            venue_card: read_required(fs, repo_root, &paths.venue_card)?,
            search_box: read_required(fs, repo_root, &paths.search_box)?,
            layout: read_required(fs, repo_root, &paths.layout)?,
            app: read_required(fs, repo_root, &paths.app)?,
            slug_util: read_required(fs, repo_root, &paths.slug_util)?,
        })
    }

    /// Page/component sources scanned for leftover legacy links, keyed by
    /// their profile path for violation reporting. The app shell is handled
    /// separately because its redirect routes are exempt.
    pub fn legacy_scan_targets<'a>(
        &'a self,
        profile: &'a SiteProfile,
    ) -> Vec<(&'a Path, &'a str)> {
        vec![
            (profile.paths.venue_card.as_path(), self.venue_card.as_str()),
            (profile.paths.search_box.as_path(), self.search_box.as_str()),
            (profile.paths.layout.as_path(), self.layout.as_str()),
            (profile.paths.home_page.as_path(), self.home_page.as_str()),
            (profile.paths.region_page.as_path(), self.region_page.as_str()),
            (
                profile.paths.detail_page.as_path(),
                self.detail_page.as_str(),
            ),
        ]
    }
}
