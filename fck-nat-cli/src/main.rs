mod stack;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use fck_nat_aws::cloudwatch::default_cloudwatch_config;
use fck_nat_core::effect::Effect;
use fck_nat_core::plan::Plan;
use fck_nat_core::resource::{Resource, Value};
use fck_nat_core::synth::Synthesizer;

use crate::stack::Stack;

#[derive(Parser)]
#[command(name = "fck-nat")]
#[command(about = "Provision fck-nat instances as a NAT gateway substitute", long_about = None)]
struct Cli {
    /// Path to the stack file
    #[arg(long, short, global = true, default_value = "fck-nat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the stack file and the resources it produces
    Validate,
    /// Show the resources that would be provisioned
    Plan,
    /// Write the synthesized template as JSON
    Synth {
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Compare the synthesized template with an existing one
    Diff {
        /// Previously synthesized template
        template: PathBuf,
    },
    /// Print the default CloudWatch agent configuration
    CloudwatchConfig,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate => run_validate(&cli.config),
        Commands::Plan => run_plan(&cli.config),
        Commands::Synth { output } => run_synth(&cli.config, output.as_deref()),
        Commands::Diff { template } => run_diff(&cli.config, &template),
        Commands::CloudwatchConfig => run_cloudwatch_config(),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn synthesize(config: &Path) -> Result<Synthesizer, String> {
    let stack = Stack::load(config)?;
    log::debug!(
        "loaded {} with {} NAT subnet(s)",
        config.display(),
        stack.options.nat_subnets.len()
    );
    stack.synthesize().map_err(|e| e.to_string())
}

fn render_template(synth: &Synthesizer) -> Result<String, String> {
    let template = synth.plan().to_template(synth.schemas());
    let mut rendered = serde_json::to_string_pretty(&template)
        .map_err(|e| format!("Failed to render template: {}", e))?;
    rendered.push('\n');
    Ok(rendered)
}

fn run_validate(config: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    let synth = synthesize(config)?;
    let plan = synth.plan();

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", plan.effects().len())
            .green()
            .bold()
    );

    for effect in plan.effects() {
        let resource = effect.resource();
        println!("  • {}.{}", resource.id.resource_type, resource.id.name);
    }

    Ok(())
}

fn run_plan(config: &Path) -> Result<(), String> {
    let synth = synthesize(config)?;
    print_plan(synth.plan());
    Ok(())
}

fn run_synth(config: &Path, output: Option<&Path>) -> Result<(), String> {
    let synth = synthesize(config)?;
    let rendered = render_template(&synth)?;

    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            println!(
                "{}",
                format!(
                    "✓ Wrote {} resources to {}",
                    synth.plan().mutation_count(),
                    path.display()
                )
                .green()
                .bold()
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn run_diff(config: &Path, template: &Path) -> Result<(), String> {
    let existing = fs::read_to_string(template)
        .map_err(|e| format!("Failed to read {}: {}", template.display(), e))?;
    let synth = synthesize(config)?;
    let rendered = render_template(&synth)?;

    if existing == rendered {
        println!("{}", "No differences.".green());
        return Ok(());
    }

    print_diff(template, &existing, &rendered);
    Ok(())
}

fn run_cloudwatch_config() -> Result<(), String> {
    let config = serde_json::to_string_pretty(&default_cloudwatch_config())
        .map_err(|e| format!("Failed to render config: {}", e))?;
    println!("{}", config);
    Ok(())
}

fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        println!("{}", "No resources.".green());
        return;
    }

    let mut binding_to_effect: HashMap<&str, usize> = HashMap::new();
    let mut effect_deps: Vec<HashSet<String>> = Vec::new();

    for (idx, effect) in plan.effects().iter().enumerate() {
        let resource = effect.resource();
        binding_to_effect.insert(resource.id.name.as_str(), idx);
        effect_deps.push(resource.dependencies());
    }

    // Reverse dependency map (who depends on this resource)
    let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, deps) in effect_deps.iter().enumerate() {
        let mut deps: Vec<_> = deps
            .iter()
            .filter_map(|d| binding_to_effect.get(d.as_str()))
            .collect();
        deps.sort();
        for dep_idx in deps {
            dependents.entry(*dep_idx).or_default().push(idx);
        }
    }

    let roots: Vec<usize> = effect_deps
        .iter()
        .enumerate()
        .filter(|(_, deps)| !deps.iter().any(|d| binding_to_effect.contains_key(d.as_str())))
        .map(|(idx, _)| idx)
        .collect();

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    let mut printed: HashSet<usize> = HashSet::new();
    for (i, root_idx) in roots.iter().enumerate() {
        print_effect_tree(
            *root_idx,
            plan,
            &dependents,
            &mut printed,
            0,
            i == roots.len() - 1,
            "",
        );
    }

    println!();
    let summary = plan.summary();
    println!(
        "Plan: {} to create, {} to look up.",
        summary.create.to_string().green(),
        summary.read.to_string().cyan()
    );
}

fn print_effect_tree(
    idx: usize,
    plan: &Plan,
    dependents: &HashMap<usize, Vec<usize>>,
    printed: &mut HashSet<usize>,
    indent: usize,
    is_last: bool,
    prefix: &str,
) {
    if !printed.insert(idx) {
        return;
    }

    let effect = &plan.effects()[idx];
    let symbol = match effect {
        Effect::Create(_) => "+".green().bold(),
        Effect::Read(_) => "?".normal(),
    };

    let base_indent = "  ";
    let attr_base = "    ";
    let connector = if indent == 0 {
        "".to_string()
    } else if is_last {
        format!("{}└─ ", prefix)
    } else {
        format!("{}├─ ", prefix)
    };
    let continuation = if is_last {
        format!("{}   ", prefix)
    } else {
        format!("{}│  ", prefix)
    };

    let resource = effect.resource();
    println!(
        "{}{}{} {} {}",
        base_indent,
        connector,
        symbol,
        resource.id.resource_type.cyan().bold(),
        resource.id.name.white().bold()
    );

    let attr_prefix = if indent == 0 {
        format!("{}{}", base_indent, attr_base)
    } else {
        format!("{}{}   ", base_indent, continuation)
    };
    print_attributes(resource, &attr_prefix);

    let children: Vec<usize> = dependents
        .get(&idx)
        .map(|c| c.iter().filter(|c| !printed.contains(*c)).copied().collect())
        .unwrap_or_default();
    let new_prefix = if indent == 0 {
        format!("{}  ", attr_base)
    } else {
        format!("{}   ", continuation)
    };

    for (i, child_idx) in children.iter().enumerate() {
        print_effect_tree(
            *child_idx,
            plan,
            dependents,
            printed,
            indent + 1,
            i == children.len() - 1,
            &new_prefix,
        );
    }
}

fn print_attributes(resource: &Resource, attr_prefix: &str) {
    let mut keys: Vec<_> = resource.attributes.keys().collect();
    keys.sort();
    for key in keys {
        let value = &resource.attributes[key];
        if key == "user_data" {
            println!("{}{}:", attr_prefix, key);
            if let Value::String(script) = value {
                for line in script.lines() {
                    println!("{}  {}", attr_prefix, line.green());
                }
            }
        } else {
            println!("{}{}: {}", attr_prefix, key, format_value(value).green());
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let strs: Vec<_> = keys
                .into_iter()
                .map(|k| format!("{}: {}", k, format_value(&map[k])))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
        Value::ResourceRef(binding, attr) => format!("{}.{}", binding, attr),
    }
}

fn print_diff(file: &Path, original: &str, synthesized: &str) {
    println!("{} {}:", "Diff for".cyan().bold(), file.display());

    let diff = TextDiff::from_lines(original, synthesized);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("{}{}", sign, change);
    }
}
