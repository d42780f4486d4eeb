use anyhow::{bail, Result};
use std::fs;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Link {
    pub title: String,
    pub url: String,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AvatarStyle {
    Full,
    Round,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Site {
    pub title: String,
    pub author: String,
    pub avatar: String,
    pub avatar_style: AvatarStyle,
    pub background: String,
}

#[derive(serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RedirectRule {
    pub from: String,
    pub to: String,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_root")]
    pub root: String,
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_root() -> String {
    "public".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            root: default_root(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct SiteConfig {
    pub site: Site,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub redirects: Vec<RedirectRule>,
    #[serde(default)]
    pub server: ServerConfig,
}

impl SiteConfig {
    pub fn from_file(file: &str) -> Result<Self> {
        Self::parse(&fs::read_to_string(file)?)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.check_redirects()?;
        Ok(config)
    }

    // Repeating an identical rule is harmless; mapping the same legacy path
    // to two different targets is a configuration mistake.
    fn check_redirects(&self) -> Result<()> {
        for (i, rule) in self.redirects.iter().enumerate() {
            for earlier in &self.redirects[..i] {
                if earlier.from == rule.from && earlier.to != rule.to {
                    bail!(
                        "redirect for {:?} declared twice with different targets ({:?} and {:?})",
                        rule.from,
                        earlier.to,
                        rule.to
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r##"
[site]
title = "Nimbus Jona Blog"
author = "Jona (turtlejona)"
avatar = "tulip.jpg"
avatar_style = "full"
background = "#fff"

[[links]]
title = "GitHub"
url = "https://github.com/tylung"

[[redirects]]
from = "iocp-links.html"
to = "iocp_links"

[[redirects]]
from = "rant.html"
to = "rant"

[server]
addr = "0.0.0.0:8080"
root = "public"
"##;

    #[test]
    fn parses_the_site_literal() {
        let config = SiteConfig::parse(EXAMPLE).unwrap();
        assert_eq!(config.site.title, "Nimbus Jona Blog");
        assert_eq!(config.site.author, "Jona (turtlejona)");
        assert_eq!(config.site.avatar, "tulip.jpg");
        assert_eq!(config.site.avatar_style, AvatarStyle::Full);
        assert_eq!(config.site.background, "#fff");
        assert_eq!(config.links.len(), 1);
        assert_eq!(config.links[0].title, "GitHub");
        assert_eq!(config.links[0].url, "https://github.com/tylung");
        assert_eq!(config.redirects.len(), 2);
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.server.root, "public");
    }

    #[test]
    fn links_keep_declaration_order() {
        let config = SiteConfig::parse(
            r#"
[site]
title = "t"
author = "a"
avatar = "a.jpg"
avatar_style = "round"
background = "black"

[[links]]
title = "first"
url = "https://example.com/1"

[[links]]
title = "second"
url = "https://example.com/2"
"#,
        )
        .unwrap();
        let titles: Vec<_> = config.links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["first", "second"]);
    }

    #[test]
    fn missing_sections_default() {
        let config = SiteConfig::parse(
            r#"
[site]
title = "t"
author = "a"
avatar = "a.jpg"
avatar_style = "full"
background = "white"
"#,
        )
        .unwrap();
        assert!(config.links.is_empty());
        assert!(config.redirects.is_empty());
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.server.root, "public");
    }

    #[test]
    fn conflicting_duplicate_redirects_are_rejected() {
        let err = SiteConfig::parse(
            r#"
[site]
title = "t"
author = "a"
avatar = "a.jpg"
avatar_style = "full"
background = "white"

[[redirects]]
from = "rant.html"
to = "rant"

[[redirects]]
from = "rant.html"
to = "elsewhere"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn identical_duplicate_redirects_are_tolerated() {
        let config = SiteConfig::parse(
            r#"
[site]
title = "t"
author = "a"
avatar = "a.jpg"
avatar_style = "full"
background = "white"

[[redirects]]
from = "rant.html"
to = "rant"

[[redirects]]
from = "rant.html"
to = "rant"
"#,
        )
        .unwrap();
        assert_eq!(config.redirects.len(), 2);
    }
}
