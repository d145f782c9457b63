//! Project configuration. Settings live in a `wordhord.yaml` file found by
//! walking upward from the working directory (or named explicitly with
//! `--config`); a missing file means an all-defaults configuration rooted
//! at the working directory. The serde-facing section structs are resolved
//! into a flat runtime [`Config`] that the store, renderer, and builder
//! borrow.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file searched for in parent directories.
pub const PROJECT_FILE: &str = "wordhord.yaml";

/// Whether hidden posts appear anywhere outside the main index.
///
/// `IndexOnly` reproduces the classic behavior: a hidden post keeps its
/// rendered file and stays listed in the archive and on tag pages, it is
/// only left off `index.html`. `Everywhere` treats hidden as unpublished:
/// no file, no archive entry, no tag page entry, no tag count.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HiddenPolicy {
    IndexOnly,
    Everywhere,
}

impl Default for HiddenPolicy {
    fn default() -> Self {
        HiddenPolicy::IndexOnly
    }
}

/// A blog author, substituted into header/footer templates.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<Url>,
}

#[derive(Deserialize)]
struct IndexLen(i64);
impl Default for IndexLen {
    fn default() -> Self {
        IndexLen(8)
    }
}

#[derive(Default, Deserialize)]
struct SiteSection {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<Url>,
    #[serde(default)]
    author: Option<Author>,
}

#[derive(Default, Deserialize)]
struct FilesSection {
    #[serde(default)]
    blog_dir: Option<PathBuf>,
    #[serde(default)]
    db_file: Option<PathBuf>,
    #[serde(default)]
    index_file: Option<String>,
    #[serde(default)]
    archive_file: Option<String>,
    #[serde(default)]
    tags_file: Option<String>,
    #[serde(default)]
    header_file: Option<PathBuf>,
    #[serde(default)]
    footer_file: Option<PathBuf>,
}

#[derive(Default, Deserialize)]
struct TemplateSection {
    #[serde(default)]
    date_format: Option<String>,
    #[serde(default)]
    tags_label: Option<String>,
    #[serde(default)]
    read_more: Option<String>,
    #[serde(default)]
    posts_label: Option<String>,
    #[serde(default)]
    all_posts: Option<String>,
    #[serde(default)]
    all_tags: Option<String>,
}

/// The serde image of `wordhord.yaml`.
#[derive(Default, Deserialize)]
struct Project {
    #[serde(default)]
    site: SiteSection,
    #[serde(default)]
    files: FilesSection,
    #[serde(default)]
    template: TemplateSection,
    #[serde(default)]
    index_len: IndexLen,
    #[serde(default)]
    hidden_policy: HiddenPolicy,
    #[serde(default)]
    upload_command: Option<String>,
}

/// The resolved runtime configuration.
pub struct Config {
    /// The project root. Relative paths below resolve against it.
    pub root: PathBuf,
    pub blog_dir: PathBuf,
    pub db_file: PathBuf,
    pub index_file: String,
    pub archive_file: String,
    pub tags_file: String,
    pub header_file: Option<PathBuf>,
    pub footer_file: Option<PathBuf>,
    pub title: String,
    pub description: String,
    pub site_url: Option<Url>,
    pub author: Option<Author>,
    pub date_format: String,
    pub tags_label: String,
    pub read_more: String,
    pub posts_label: String,
    pub all_posts_label: String,
    pub all_tags_label: String,
    pub index_len: i64,
    pub hidden_policy: HiddenPolicy,
    pub upload_command: Option<String>,
}

impl Config {
    /// Loads configuration. An explicit path must exist; without one the
    /// project file is searched for from `start` upward, falling back to
    /// defaults rooted at `start` when no file is found.
    pub fn load(explicit: Option<&Path>, start: &Path) -> Result<Config> {
        match explicit {
            Some(path) => Config::from_project_file(path),
            None => Config::from_directory(start),
        }
    }

    /// Searches `dir` and its ancestors for [`PROJECT_FILE`].
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.exists() {
                return Config::from_project_file(&path);
            }
            current = dir.parent();
        }
        Ok(Config::resolve(Project::default(), dir.to_owned()))
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Config(format!("opening project file `{}`: {}", path.display(), e))
        })?;
        let project: Project = serde_yaml::from_reader(file)?;
        let root = match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
            Some(parent) => parent.to_owned(),
            None => PathBuf::from("."),
        };
        Ok(Config::resolve(project, root))
    }

    fn resolve(project: Project, root: PathBuf) -> Config {
        let files = project.files;
        let template = project.template;
        let site = project.site;
        Config {
            blog_dir: root.join(files.blog_dir.unwrap_or_else(|| PathBuf::from("."))),
            db_file: root.join(files.db_file.unwrap_or_else(|| PathBuf::from("wordhord.db"))),
            index_file: files.index_file.unwrap_or_else(|| "index.html".into()),
            archive_file: files.archive_file.unwrap_or_else(|| "all_posts.html".into()),
            tags_file: files.tags_file.unwrap_or_else(|| "all_tags.html".into()),
            header_file: files.header_file.map(|p| root.join(p)),
            footer_file: files.footer_file.map(|p| root.join(p)),
            title: site.title.unwrap_or_else(|| "This is a blog".into()),
            description: site.description.unwrap_or_default(),
            site_url: site.url,
            author: site.author,
            date_format: template.date_format.unwrap_or_else(|| "%B %d, %Y".into()),
            tags_label: template.tags_label.unwrap_or_else(|| "Tags:".into()),
            read_more: template.read_more.unwrap_or_else(|| "Read more...".into()),
            posts_label: template.posts_label.unwrap_or_else(|| "posts".into()),
            all_posts_label: template.all_posts.unwrap_or_else(|| "All posts".into()),
            all_tags_label: template.all_tags.unwrap_or_else(|| "All tags".into()),
            index_len: project.index_len.0,
            hidden_policy: project.hidden_policy,
            upload_command: project.upload_command,
            root,
        }
    }

    /// True when hidden posts still reach the archive, tag pages, and
    /// their own file.
    pub fn include_hidden_outside_index(&self) -> bool {
        self.hidden_policy == HiddenPolicy::IndexOnly
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::resolve(Project::default(), PathBuf::from("/tmp/blog"));
        assert_eq!(PathBuf::from("/tmp/blog/wordhord.db"), config.db_file);
        assert_eq!(PathBuf::from("/tmp/blog/."), config.blog_dir);
        assert_eq!("index.html", config.index_file);
        assert_eq!(8, config.index_len);
        assert_eq!("Tags:", config.tags_label);
        assert_eq!(HiddenPolicy::IndexOnly, config.hidden_policy);
        assert!(config.include_hidden_outside_index());
    }

    #[test]
    fn test_parse_project_file() {
        let yaml = r#"
site:
  title: Wordhoard
  description: notes and runes
  url: https://blog.example.org/
  author:
    name: Hrothgar
    email: hrothgar@example.org
files:
  blog_dir: public
  db_file: hoard.db
template:
  date_format: "%Y-%m-%d"
index_len: 3
hidden_policy: everywhere
"#;
        let project: Project = serde_yaml::from_str(yaml).unwrap();
        let config = Config::resolve(project, PathBuf::from("proj"));
        assert_eq!("Wordhoard", config.title);
        assert_eq!(PathBuf::from("proj/public"), config.blog_dir);
        assert_eq!(PathBuf::from("proj/hoard.db"), config.db_file);
        assert_eq!(3, config.index_len);
        assert_eq!(HiddenPolicy::Everywhere, config.hidden_policy);
        assert!(!config.include_hidden_outside_index());
        assert_eq!(
            "https://blog.example.org/",
            config.site_url.unwrap().to_string()
        );
        assert_eq!("Hrothgar", config.author.unwrap().name);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/no/such/wordhord.yaml")), Path::new(".")).is_err());
    }
}
