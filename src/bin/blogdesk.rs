use std::sync::Arc;

use blogdesk_lib::ipc::{JsonLinesMessenger, LogMessenger, Messenger};
use blogdesk_lib::models::{Blog, BlogId};
use blogdesk_lib::{build_sync, logging, BlogList, Settings};
use serde::Serialize;

const PASSWORD_ENV: &str = "BLOGDESK_PASSWORD";

#[derive(Debug, Default)]
struct CliArgs {
    command: String,
    url: Option<String>,
    user: Option<String>,
    id: Option<String>,
    json: bool,
    emit: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlogPayload<'a> {
    id: &'a str,
    index: i64,
    name: &'a str,
    url: &'a str,
    identification: &'a str,
    is_selected: bool,
    icon_color: &'a str,
}

impl<'a> From<&'a Blog> for BlogPayload<'a> {
    fn from(blog: &'a Blog) -> Self {
        Self {
            id: blog.id().as_str(),
            index: blog.index(),
            name: blog.name(),
            url: blog.url(),
            identification: blog.identification(),
            is_selected: blog.is_selected(),
            icon_color: blog.icon_color().as_str(),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = parse_args(std::env::args().skip(1).collect());
    if args.command == "--help" || args.command == "-h" {
        print_help();
        return;
    }
    if args.command == "--version" || args.command == "-V" {
        println!("blogdesk {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let settings = Settings::load();
    logging::init(&settings);

    let messenger: Arc<dyn Messenger> = if args.emit {
        Arc::new(JsonLinesMessenger::new(std::io::stdout()))
    } else {
        Arc::new(LogMessenger)
    };
    let sync = build_sync(&settings, messenger).await;
    let mut blogs = match BlogList::load(sync).await {
        Ok(blogs) => blogs,
        Err(err) => {
            eprintln!("Failed to load blogs: {err}");
            std::process::exit(1);
        }
    };

    let result = match args.command.as_str() {
        "list" => run_list(&blogs, args.json),
        "add" => run_add(&mut blogs, &args).await,
        "select" => run_select(&mut blogs, &args).await,
        "remove" => run_remove(&mut blogs, &args).await,
        "password" => run_password(&blogs, &args).await,
        _ => Err(format!(
            "Unknown command: {}. Use --help for usage.",
            args.command
        )),
    };

    if let Err(message) = result {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn parse_args(mut argv: Vec<String>) -> CliArgs {
    let mut args = CliArgs::default();

    if let Some(first) = argv.first() {
        if !first.starts_with('-') {
            args.command = argv.remove(0);
        }
    }
    if args.command.is_empty() {
        args.command = "list".to_string();
    }

    let mut iter = argv.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--url" => args.url = iter.next(),
            "--user" => args.user = iter.next(),
            "--id" => args.id = iter.next(),
            "--json" => args.json = true,
            "--emit" => args.emit = true,
            "--help" | "-h" | "--version" | "-V" => {
                args.command = arg;
                break;
            }
            _ => {}
        }
    }

    args
}

fn print_help() {
    println!(
        "blogdesk - manage blogs and their vaulted passwords

Usage:
  blogdesk list [--json]
  blogdesk add --url <URL> --user <IDENTIFICATION>   (password from ${PASSWORD_ENV})
  blogdesk select --id <ID>
  blogdesk remove --id <ID>
  blogdesk password --id <ID>

Options:
  --emit     Write blog-serialized notifications to stdout as JSON lines
  --json     JSON output for list
  -h, --help
  -V, --version"
    );
}

fn required_id(args: &CliArgs) -> Result<BlogId, String> {
    args.id
        .as_deref()
        .map(BlogId::from)
        .ok_or_else(|| "Missing --id".to_string())
}

fn run_list(blogs: &BlogList, json: bool) -> Result<(), String> {
    if json {
        let payloads: Vec<BlogPayload> = blogs.blogs().iter().map(BlogPayload::from).collect();
        let output = serde_json::to_string_pretty(&payloads).map_err(|e| e.to_string())?;
        println!("{output}");
        return Ok(());
    }

    if blogs.is_empty() {
        println!("No blogs yet. Add one with `blogdesk add --url <URL> --user <ID>`.");
    }
    for blog in blogs.blogs() {
        let marker = if blog.is_selected() { "*" } else { " " };
        println!(
            "{marker} {}  {}  {} ({})",
            blog.id(),
            blog.name(),
            blog.url(),
            blog.identification()
        );
    }
    Ok(())
}

async fn run_add(blogs: &mut BlogList, args: &CliArgs) -> Result<(), String> {
    let url = args.url.as_deref().ok_or("Missing --url")?;
    let user = args.user.as_deref().ok_or("Missing --user")?;
    let password = std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty());

    let blog = blogs
        .add(url, user, password.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    eprintln!("Added {} as {}", blog.name(), blog.id());
    Ok(())
}

async fn run_select(blogs: &mut BlogList, args: &CliArgs) -> Result<(), String> {
    let id = required_id(args)?;
    blogs.select_only(&id).await.map_err(|e| e.to_string())
}

async fn run_remove(blogs: &mut BlogList, args: &CliArgs) -> Result<(), String> {
    let id = required_id(args)?;
    let removed = blogs.remove(&id).await.map_err(|e| e.to_string())?;
    eprintln!("Removed {}", removed.name());
    Ok(())
}

async fn run_password(blogs: &BlogList, args: &CliArgs) -> Result<(), String> {
    let id = required_id(args)?;
    let blog = blogs
        .get(&id)
        .ok_or_else(|| format!("No blog with id {id}"))?;
    let password = blogs
        .sync()
        .get_password(blog)
        .await
        .map_err(|e| e.to_string())?;
    println!(
        "{}",
        if password.is_some() {
            "password stored"
        } else {
            "no password stored"
        }
    );
    Ok(())
}
