use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use filterchain::config::RenderSettings;
use filterchain::{Evaluator, ExecutionContext, ExpressionParser, FilterRegistry, Value};

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let matches = clap::Command::new("filterchain")
        .about("Evaluate a template expression such as `name|upper|truncatechars:5`")
        .arg(
            Arg::new("expression")
                .value_name("EXPRESSION")
                .help("Expression to evaluate")
                .required_unless_present("list"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG")
                .help("Path to a YAML or JSON file with variables and filter aliases"),
        )
        .arg(
            Arg::new("set")
                .short('s')
                .long("set")
                .value_name("KEY=VALUE")
                .action(ArgAction::Append)
                .help("Bind a string variable, overriding the config file"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List registered filters and exit"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let settings = match matches.get_one::<String>("config") {
        Some(path) => RenderSettings::load(Path::new(path))?,
        None => RenderSettings::default(),
    };

    let registry = FilterRegistry::global();
    settings
        .register_aliases(registry)
        .context("Failed to register filter aliases")?;

    if matches.get_flag("list") {
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut bindings = settings.bindings();
    for assignment in matches.get_many::<String>("set").into_iter().flatten() {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("Invalid --set value '{}': expected KEY=VALUE", assignment);
        };
        bindings.insert(key.trim().to_string(), Value::from(value));
    }

    let expression = matches
        .get_one::<String>("expression")
        .context("Missing expression")?;

    let mut parser = ExpressionParser::from_source(expression, registry)?;
    let mut ctx = ExecutionContext::new(bindings);
    if let Some(template) = &settings.template {
        parser = parser.with_template(template.as_str());
        ctx = ctx.with_template(template.as_str());
    }

    let expr = parser.parse_expression()?;
    println!("{}", expr.evaluate(&ctx)?);
    Ok(())
}
