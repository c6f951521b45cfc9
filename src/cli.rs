//! Subcommands: diagram, dot, summary

use anyhow::Context;
use classgraph::{
    analyze_package, generate_diagram, BaseEdgePolicy, ClassModel, ClassRecord, ClassVisitor,
    DiagramConfig, DotRenderer, EdgeKind, Graphviz, ImageFormat, ImportAttribution, ImportStyle,
    ModuleClasses, Relation,
};
use clap::{Args, Subcommand};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Render the class diagram image with Graphviz (the default)
    Diagram(DiagramArgs),
    /// Print the DOT description without running Graphviz
    Dot {
        /// Package directory (default: blyzer)
        #[arg(short, long)]
        path: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// List discovered classes and relations
    Summary {
        /// Package directory (default: blyzer)
        #[arg(short, long)]
        path: Option<PathBuf>,
        /// JSON output
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        style: StyleArgs,
    },
}

#[derive(Args, Debug, Default)]
pub struct DiagramArgs {
    /// Package directory (default: blyzer)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
    /// Output directory (default: documentation/UML)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// Image format (png, svg, pdf)
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ImageFormat>,
    /// Keep the intermediate .dot file
    #[arg(long)]
    pub keep_dot: bool,
    #[command(flatten)]
    pub style: StyleArgs,
}

#[derive(Args, Debug, Default)]
pub struct StyleArgs {
    /// Draw an edge to every in-package base, not only the last one
    #[arg(long)]
    all_bases: bool,
    /// Draw import edges dashed with an open arrowhead
    #[arg(long)]
    distinct_imports: bool,
    /// Attribute imports to every class of the importing module
    #[arg(long)]
    module_imports: bool,
}

impl StyleArgs {
    fn apply(&self, config: &mut DiagramConfig) {
        if self.all_bases {
            config.base_edges = BaseEdgePolicy::All;
        }
        if self.distinct_imports {
            config.import_style = ImportStyle::Distinct;
        }
        if self.module_imports {
            config.import_attribution = ImportAttribution::Module;
        }
    }
}

fn parse_format(s: &str) -> Result<ImageFormat, String> {
    ImageFormat::from_str(s).ok_or_else(|| format!("unsupported format `{}` (png, svg, pdf)", s))
}

fn load_config(path: Option<PathBuf>, style: &StyleArgs) -> DiagramConfig {
    let mut config = DiagramConfig::from_env();
    if let Some(path) = path {
        config.package = path;
    }
    style.apply(&mut config);
    config
}

pub fn run(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Diagram(args) => {
            let mut config = load_config(args.path, &args.style);
            if let Some(out) = args.out {
                config.output_dir = out;
            }
            if let Some(format) = args.format {
                config.format = format;
            }
            config.keep_dot |= args.keep_dot;
            cmd_diagram(&config)
        }
        Commands::Dot { path, output, style } => cmd_dot(&load_config(path, &style), output),
        Commands::Summary { path, json, style } => cmd_summary(&load_config(path, &style), json),
    }
}

fn cmd_diagram(config: &DiagramConfig) -> anyhow::Result<()> {
    let engine = Graphviz::new().with_program(&config.dot_program);
    let output = generate_diagram(config, &engine)
        .with_context(|| format!("Failed to diagram {}", config.package.display()))?;

    println!("{} classes", output.classes);
    println!("Saved to: {}", output.image.display());
    if let Some(dot) = output.dot {
        println!("DOT kept at: {}", dot.display());
    }

    Ok(())
}

fn cmd_dot(config: &DiagramConfig, output: Option<PathBuf>) -> anyhow::Result<()> {
    let model = analyze(config)?;
    let renderer = DotRenderer::from_config(config);

    match output {
        Some(file) => {
            renderer
                .export(&model, &file)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("Saved to: {}", file.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            renderer.render(&model, &mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}

fn cmd_summary(config: &DiagramConfig, json: bool) -> anyhow::Result<()> {
    let model = analyze(config)?;
    let relations = model.relations(config.base_edges);

    if json {
        #[derive(serde::Serialize)]
        struct Summary<'a> {
            package: String,
            classes: &'a [ClassRecord],
            modules: &'a [ModuleClasses],
            relations: &'a [Relation],
            imports: &'a BTreeMap<usize, Vec<String>>,
            attributes: &'a BTreeMap<usize, Vec<String>>,
        }

        let summary = Summary {
            package: config.package_name(),
            classes: model.classes(),
            modules: model.modules(),
            relations: &relations,
            imports: model.imports(),
            attributes: model.attribute_usage(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_summary(config, &model, &relations);
    Ok(())
}

fn analyze(config: &DiagramConfig) -> anyhow::Result<ClassModel> {
    analyze_package(&config.package, ClassVisitor::from_config(config))
        .with_context(|| format!("Failed to analyze {}", config.package.display()))
}

fn print_summary(config: &DiagramConfig, model: &ClassModel, relations: &[Relation]) {
    let inheritance = relations
        .iter()
        .filter(|r| r.kind == EdgeKind::Inheritance)
        .count();

    println!("Package: {}", config.package.display());
    println!(
        "{} classes in {} modules, {} inheritance and {} import edges\n",
        model.len(),
        model.modules().len(),
        inheritance,
        relations.len() - inheritance
    );

    for (module, classes) in model.dependency_graph() {
        println!("{}", module);
        for class in classes {
            println!("  {}", describe(class));
            if let Some(attrs) = model.attribute_usage().get(&class.ordinal) {
                println!("      uses: {}", attrs.join(", "));
            }
            if let Some(imports) = model.imports().get(&class.ordinal) {
                println!("      imports: {}", imports.join(", "));
            }
        }
    }

    if !relations.is_empty() {
        println!("\nEdges:");
        for relation in relations {
            let name = |ordinal: usize| model.class(ordinal).map_or("?", |c| c.name.as_str());
            let arrow = match relation.kind {
                EdgeKind::Inheritance => "extends",
                EdgeKind::Import => "imported by",
            };
            println!("  {} {} {}", name(relation.from), arrow, name(relation.to));
        }
    }
}

fn describe(class: &ClassRecord) -> String {
    let mut line = format!("[{}] {}", class.ordinal, class.name);
    if !class.bases.is_empty() {
        line.push_str(&format!("({})", class.bases.join(", ")));
    }
    if !class.fields.is_empty() {
        line.push_str(&format!("  fields: {}", class.fields.join(", ")));
    }
    if !class.methods.is_empty() {
        let methods: Vec<String> = class.methods.iter().map(|m| format!("{}()", m)).collect();
        line.push_str(&format!("  methods: {}", methods.join(", ")));
    }
    line
}
