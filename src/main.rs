use anyhow::Context;
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use std::io::Read;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wordhord::build::Site;
use wordhord::config::Config;
use wordhord::date;
use wordhord::store::{SortField, Store};

fn app() -> App<'static, 'static> {
    App::new("wordhord")
        .version(crate_version!())
        .about("A SQLite-backed static blog generator")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Path to the project file (default: search for wordhord.yaml upward)")
                .takes_value(true)
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("init")
                .about("Initialize a new blog: create an empty database")
                .arg(
                    Arg::with_name("DIRECTORY")
                        .help("Directory to create the database in (default: project root)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("post")
                .about("Write a new blog post from a file or standard input")
                .arg(
                    Arg::with_name("hidden")
                        .long("hidden")
                        .help("Make this post hidden (a draft)"),
                )
                .arg(
                    Arg::with_name("from")
                        .short("f")
                        .long("from")
                        .value_name("FILE")
                        .help("Read post source from FILE instead of standard input")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("ls")
                .about("List all blog posts")
                .arg(
                    Arg::with_name("order-by")
                        .long("order-by")
                        .value_name("FIELD")
                        .possible_values(&["id", "title", "date"])
                        .help("Field to order by (default: date)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("asc")
                        .long("asc")
                        .conflicts_with("desc")
                        .help("Ascending order"),
                )
                .arg(
                    Arg::with_name("desc")
                        .long("desc")
                        .help("Descending order (default)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("edit")
                .about("Replace a post's title, body, and tags from new source")
                .arg(Arg::with_name("ID").required(true))
                .arg(
                    Arg::with_name("from")
                        .short("f")
                        .long("from")
                        .value_name("FILE")
                        .help("Read the replacement source from FILE instead of standard input")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("print")
                        .short("p")
                        .long("print")
                        .help("Print the post's current source and exit without editing"),
                ),
        )
        .subcommand(
            SubCommand::with_name("hide")
                .about("Flag a post with given ID as hidden")
                .arg(Arg::with_name("ID").required(true)),
        )
        .subcommand(
            SubCommand::with_name("unhide")
                .about("Flag a post with given ID as not hidden")
                .arg(Arg::with_name("ID").required(true)),
        )
        .subcommand(
            SubCommand::with_name("rm")
                .about(
                    "Remove a post from the database and the directory tree. \
                     Consider hiding instead, which keeps the data around",
                )
                .arg(Arg::with_name("ID").required(true)),
        )
        .subcommand(SubCommand::with_name("rebuild").about("Rebuild all posts, tags and indexes"))
        .subcommand(
            SubCommand::with_name("prune-tags").about("Delete tags no longer attached to any post"),
        )
        .subcommand(
            SubCommand::with_name("upload").about("Upload the blog with the configured command"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let matches = app().get_matches();
    let cwd = std::env::current_dir()?;
    let config = Config::load(matches.value_of("config").map(Path::new), &cwd)?;

    match matches.subcommand() {
        ("init", Some(m)) => init(&config, m.value_of("DIRECTORY")).await,
        ("post", Some(m)) => {
            let source = read_source(m)?;
            let site = Site::new(config).await?;
            let id = site.create_post(&source, m.is_present("hidden")).await?;
            println!("Created post with id {}", id);
            Ok(())
        }
        ("ls", Some(m)) => {
            let store = Store::open(&config.db_file).await?;
            let field = SortField::from_flag(m.value_of("order-by"));
            let posts = store.list_posts(field, m.is_present("asc")).await?;
            print_listing(&posts);
            Ok(())
        }
        ("edit", Some(m)) => {
            let id = post_id(m)?;
            let site = Site::new(config).await?;
            if m.is_present("print") {
                print!("{}", site.post_source(id).await?);
                return Ok(());
            }
            let source = read_source(m)?;
            site.edit_post(id, &source).await?;
            Ok(())
        }
        ("hide", Some(m)) => {
            let site = Site::new(config).await?;
            site.set_hidden(post_id(m)?, true).await?;
            Ok(())
        }
        ("unhide", Some(m)) => {
            let site = Site::new(config).await?;
            site.set_hidden(post_id(m)?, false).await?;
            Ok(())
        }
        ("rm", Some(m)) => {
            let id = post_id(m)?;
            let site = Site::new(config).await?;
            site.remove_post(id).await?;
            println!("Deleted post with id {}", id);
            Ok(())
        }
        ("rebuild", Some(_)) => {
            let site = Site::new(config).await?;
            site.rebuild().await?;
            Ok(())
        }
        ("prune-tags", Some(_)) => {
            let store = Store::open(&config.db_file).await?;
            let pruned = store.prune_orphan_tags().await?;
            println!("Pruned {} orphan tag(s)", pruned);
            Ok(())
        }
        ("upload", Some(_)) => upload(&config),
        _ => unreachable!("clap requires a subcommand"),
    }
}

async fn init(config: &Config, directory: Option<&str>) -> anyhow::Result<()> {
    let db_path = match directory {
        Some(dir) => {
            let dir = Path::new(dir);
            match config.db_file.file_name() {
                Some(name) => dir.join(name),
                None => dir.join("wordhord.db"),
            }
        }
        None => config.db_file.clone(),
    };
    info!(db = %db_path.display(), "initializing empty database");
    Store::create(&db_path).await?;
    println!("Initialized empty database in `{}`", db_path.display());
    Ok(())
}

/// Reads post source from `--from FILE` or, without it, standard input.
fn read_source(m: &ArgMatches) -> anyhow::Result<String> {
    match m.value_of("from") {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading `{}`", path))
        }
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("reading post source from stdin")?;
            Ok(source)
        }
    }
}

fn post_id(m: &ArgMatches) -> anyhow::Result<i64> {
    m.value_of("ID")
        .unwrap_or_default()
        .parse()
        .context("ID must be an integer")
}

fn print_listing(posts: &[wordhord::store::Post]) {
    println!("{:>6} | {:>16} | {:>6} | {}", "ID", "Date", "Hidden", "Title");
    println!(
        "{}-+-{}-+--------+-{}",
        "-".repeat(6),
        "-".repeat(16),
        "-".repeat(25)
    );
    for post in posts {
        let date = date::store_format(&post.publish_date);
        let date = &date[..16.min(date.len())];
        println!(
            "{:>6} | {:>16} | {:>6} | {}",
            post.id,
            date,
            if post.hidden { "\u{2714}" } else { " " },
            post.title
        );
    }
}

fn upload(config: &Config) -> anyhow::Result<()> {
    let command = config
        .upload_command
        .as_ref()
        .context("no `upload_command` configured in wordhord.yaml")?;
    info!(%command, "uploading blog");
    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .context("running the upload command")?;
    anyhow::ensure!(status.success(), "upload command exited with {}", status);
    Ok(())
}
