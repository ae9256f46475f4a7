use anyhow::{bail, Context, Result};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;
use tracing::info;

use favicon_pin::config::Config;
use favicon_pin::controller::Controller;
use favicon_pin::dom::{Document, LinkSpec, MemoryPage};
use favicon_pin::init::{init_store, setup_logging};
use favicon_pin::orchestrator::{NavigationOutcome, Orchestrator};
use favicon_pin::rules::{export_rules, import_rules, validate_rule, RuleKind};
use favicon_pin::scheduler::LocalScheduler;
use favicon_pin::store::{delete_rule, set_rules, upsert_rule, RuleDraft};

const USAGE: &str = "usage: favicon-pin [--config <path>] <command>

commands:
  resolve <url>                          show the rule that applies to <url>
  add <domain|pattern> <value> <icon>    add a rule
  remove <id>                            delete a rule
  import <file>                          replace all rules with a JSON export
  export [file]                          write all rules as JSON
  simulate <url> [path...]               run the enforcement loop on an in-memory page";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // 1. Load Config
    let config_path = match args.iter().position(|a| a == "--config") {
        Some(idx) => {
            if idx + 1 >= args.len() {
                bail!("--config needs a path\n\n{}", USAGE);
            }
            let path = args.remove(idx + 1);
            args.remove(idx);
            path
        }
        None => "favicon-pin.toml".to_string(),
    };
    let config_exists = Path::new(&config_path).exists();
    let config = if config_exists {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    if !config_exists {
        info!("Config file {} not found, using defaults.", config_path);
    }

    // 3. Open Store
    let store = init_store(&config);
    let orchestrator = Orchestrator::new(store.clone());

    // 4. Dispatch
    let Some((command, rest)) = args.split_first() else {
        bail!("{}", USAGE);
    };
    match (command.as_str(), rest) {
        ("resolve", [url]) => match orchestrator.lookup(url).await {
            Some(rule) => println!("{}", serde_json::to_string_pretty(&rule)?),
            None => println!("no matching rule for {}", url),
        },
        ("add", [kind, value, icon]) => {
            let kind = match kind.as_str() {
                "domain" => RuleKind::Domain,
                "pattern" => RuleKind::Pattern,
                other => bail!("unknown rule type '{}'", other),
            };
            let draft = RuleDraft::new(kind, value.trim(), icon.trim());
            validate_rule(&draft.to_rule())?;
            let rules = upsert_rule(store.as_ref(), draft).await?;
            info!("{} rules stored", rules.len());
        }
        ("remove", [id]) => {
            let rules = delete_rule(store.as_ref(), id).await?;
            info!("{} rules stored", rules.len());
        }
        ("import", [file]) => {
            let text = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("Failed to read {}", file))?;
            let rules = import_rules(&text)?;
            let rules = set_rules(store.as_ref(), rules).await?;
            info!("Imported {} rules", rules.len());
        }
        ("export", []) => println!("{}", export_rules(&store.get().await?)?),
        ("export", [file]) => {
            let json = export_rules(&store.get().await?)?;
            tokio::fs::write(file, json)
                .await
                .with_context(|| format!("Failed to write {}", file))?;
            info!("Exported rules to {}", file);
        }
        ("simulate", [url, paths @ ..]) => {
            let local = Rc::new(LocalSet::new());
            local
                .run_until(simulate(&config, &orchestrator, local.clone(), url, paths))
                .await?;
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

/// Loads `url` into an in-memory page with a hostile icon script, applies the
/// matching rule and walks the page through same-document navigations.
async fn simulate(
    config: &Config,
    orchestrator: &Orchestrator,
    local: Rc<LocalSet>,
    url: &str,
    paths: &[String],
) -> Result<()> {
    let page = Rc::new(MemoryPage::new(url));
    let scheduler = Rc::new(LocalScheduler::new(local));
    let controller = Controller::new(
        page.clone(),
        page.clone(),
        scheduler,
        config.enforcement.clone(),
    );
    let settle = config.enforcement.debounce() + Duration::from_millis(50);

    page.append_link(&LinkSpec::new("icon", "/favicon.ico"))?;

    match orchestrator.on_navigation_completed(&controller, url).await {
        NavigationOutcome::Applied(rule) => info!("Rule {} applied", rule.id),
        other => {
            info!("Nothing to enforce: {:?}", other);
            return Ok(());
        }
    }

    // The page restores its own icon.
    page.append_link(&LinkSpec::new("shortcut icon", "/favicon.ico"))?;
    tokio::time::sleep(settle).await;
    report(&page, &controller)?;

    for path in paths {
        page.push_state(path)?;
        tokio::time::sleep(settle).await;
        report(&page, &controller)?;
    }
    Ok(())
}

fn report(page: &MemoryPage, controller: &Controller) -> Result<()> {
    println!("{}", page.location()?);
    for link in page.icon_links()? {
        let owner = if controller.owns(&link) { "override" } else { "page" };
        println!("  {:<30} {:<9} {}", link.rel, owner, link.href);
    }
    Ok(())
}
