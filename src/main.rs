use anyhow::{Context, Result};
use blogview::blog::{FallbackPosts, PostRepository};
use blogview::config::Config;
use blogview::feed::build_http_client;
use blogview::render::{
    CategoriesView, CategoryView, HomeView, Page, PostView, DEFAULT_PER_PAGE,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit status when `post <SLUG>` matches nothing.
const EXIT_NOT_FOUND: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "blogview", version, about = "Read a Blogger blog from the terminal")]
struct Args {
    /// Config file (default: ~/.config/blogview/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Featured post, top stories, recent posts and categories
    Home,
    /// Paginated list of all posts
    Posts {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        #[arg(long, default_value_t = DEFAULT_PER_PAGE as u32, value_parser = clap::value_parser!(u32).range(1..=100))]
        per_page: u32,
    },
    /// A single post by slug
    Post { slug: String },
    /// All category labels
    Categories,
    /// Posts carrying a category label
    Category { label: String },
}

fn emit<T: Serialize + Display>(view: &T, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(view).context("Failed to serialize output")?;
        println!("{out}");
    } else {
        print!("{view}");
    }
    Ok(())
}

/// Loads the fallback posts file, resolving a relative path against the
/// directory of the config file that named it.
fn load_fallback(config: &Config, config_path: Option<&Path>) -> Result<FallbackPosts> {
    let Some(path) = &config.fallback_posts else {
        return Ok(FallbackPosts::builtin());
    };

    let path = match config_path.and_then(Path::parent) {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.clone(),
    };

    FallbackPosts::load(&path)
        .with_context(|| format!("Failed to load fallback posts from {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = args.config.clone().or_else(Config::default_path);
    let config = match &config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    }
    .with_env();

    let settings = config
        .feed_settings()
        .context("Invalid feed configuration")?;
    let fallback = load_fallback(&config, config_path.as_deref())?;
    let http = build_http_client().context("Failed to build HTTP client")?;

    tracing::debug!(feed = %settings.endpoint, origin = %settings.origin, "Using blog feed");
    let repository = PostRepository::from_settings(http, &settings, fallback);

    match args.command {
        Command::Home => {
            let posts = repository.list_posts().await;
            let categories = repository.list_categories().await;
            emit(&HomeView::new(&posts, &categories), args.json)?;
        }
        Command::Posts { page, per_page } => {
            let posts = repository.list_posts().await;
            emit(
                &Page::new(&posts, page as usize, per_page as usize),
                args.json,
            )?;
        }
        Command::Post { slug } => match repository.get_post(&slug).await {
            Some(post) => emit(&PostView(&post), args.json)?,
            None => {
                eprintln!("Post not found: {slug}");
                return Ok(ExitCode::from(EXIT_NOT_FOUND));
            }
        },
        Command::Categories => {
            let categories = repository.list_categories().await;
            emit(&CategoriesView(&categories), args.json)?;
        }
        Command::Category { label } => {
            let posts = repository.posts_in_category(&label).await;
            emit(&CategoryView::new(&label, &posts), args.json)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_subcommands() {
        let args = Args::try_parse_from(["blogview", "--json", "posts", "--page", "2"]).unwrap();
        assert!(args.json);
        assert!(matches!(
            args.command,
            Command::Posts { page: 2, per_page: 10 }
        ));

        let args = Args::try_parse_from(["blogview", "post", "fuji-guide", "--config", "/tmp/c.toml"])
            .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(args.command, Command::Post { ref slug } if slug == "fuji-guide"));
    }

    #[test]
    fn test_args_reject_page_zero() {
        assert!(Args::try_parse_from(["blogview", "posts", "--page", "0"]).is_err());
        assert!(Args::try_parse_from(["blogview"]).is_err());
    }

    #[test]
    fn test_fallback_path_relative_to_config() {
        let config = Config {
            fallback_posts: Some(PathBuf::from("does-not-exist.toml")),
            ..Config::default()
        };
        let err = load_fallback(&config, Some(Path::new("/tmp/blogview-conf/config.toml")))
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("/tmp/blogview-conf/does-not-exist.toml"));
    }

    #[test]
    fn test_fallback_defaults_to_builtin() {
        let fallback = load_fallback(&Config::default(), None).unwrap();
        assert_eq!(fallback.posts().len(), 6);
    }
}
