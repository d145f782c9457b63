//! Header and footer templating. Both are opaque template strings (from
//! the configured files, or built-in defaults) rendered once per process
//! with the site fields substituted: `{{.title}}`, `{{.description}}`,
//! `{{.site_url}}`, `{{.author_name}}`, `{{.author_email}}`,
//! `{{.author_url}}`, `{{.all_posts}}` and `{{.all_tags}}`.

use crate::config::Config;
use crate::error::{Error, Result};
use gtmpl::Template;
use gtmpl_derive::Gtmpl;
use std::path::Path;

const DEFAULT_HEADER: &str = "<!doctype html>\n\
<html>\n\
<head>\n\
    <meta charset=\"utf-8\" />\n\
    <title>{{.title}}</title>\n\
</head>\n\
<body>\n";

const DEFAULT_FOOTER: &str = "\n</body></html>";

/// The fields a header or footer template may reference.
#[derive(Gtmpl)]
struct SiteContext {
    title: String,
    description: String,
    site_url: String,
    author_name: String,
    author_email: String,
    author_url: String,
    all_posts: String,
    all_tags: String,
}

impl SiteContext {
    fn from_config(config: &Config) -> SiteContext {
        let author = config.author.as_ref();
        SiteContext {
            title: config.title.clone(),
            description: config.description.clone(),
            site_url: config
                .site_url
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_default(),
            author_name: author.map(|a| a.name.clone()).unwrap_or_default(),
            author_email: author
                .and_then(|a| a.email.clone())
                .unwrap_or_default(),
            author_url: author
                .and_then(|a| a.url.as_ref().map(|u| u.to_string()))
                .unwrap_or_default(),
            all_posts: config.all_posts_label.clone(),
            all_tags: config.all_tags_label.clone(),
        }
    }
}

/// Renders one template string against the site fields.
fn render(text: &str, context: SiteContext) -> Result<String> {
    let mut template = Template::default();
    template.parse(text).map_err(Error::Template)?;
    let context =
        gtmpl::Context::from(context).map_err(|e| Error::Template(format!("{:?}", e)))?;
    let mut out: Vec<u8> = Vec::new();
    template.execute(&mut out, &context).map_err(Error::Template)?;
    String::from_utf8(out).map_err(|e| Error::Template(e.to_string()))
}

fn load(path: Option<&Path>, fallback: &str) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("reading template `{}`: {}", path.display(), e))
        }),
        None => Ok(fallback.to_owned()),
    }
}

/// Loads and renders the header and footer for this configuration.
pub fn header_and_footer(config: &Config) -> Result<(String, String)> {
    let header_text = load(config.header_file.as_deref(), DEFAULT_HEADER)?;
    let footer_text = load(config.footer_file.as_deref(), DEFAULT_FOOTER)?;
    let header = render(&header_text, SiteContext::from_config(config))?;
    let footer = render(&footer_text, SiteContext::from_config(config))?;
    Ok((header, footer))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use std::path::Path;

    fn config() -> Config {
        Config::load(None, Path::new("/nonexistent")).unwrap()
    }

    #[test]
    fn test_default_header_substitutes_title() {
        let (header, footer) = header_and_footer(&config()).unwrap();
        assert!(header.contains("<title>This is a blog</title>"));
        assert_eq!("\n</body></html>", footer);
    }

    #[test]
    fn test_custom_placeholders() {
        let mut config = config();
        config.title = "Runes".into();
        config.description = "stray thoughts".into();
        let rendered = render(
            "{{.title}} | {{.description}} | {{.all_posts}}",
            SiteContext::from_config(&config),
        )
        .unwrap();
        assert_eq!("Runes | stray thoughts | All posts", rendered);
    }

    #[test]
    fn test_unclosed_action_is_an_error() {
        assert!(render("{{.title", SiteContext::from_config(&config())).is_err());
    }
}
