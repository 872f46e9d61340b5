//! JMS Merger CLI
//!
//! Merge per-LOD model sources and compile them into one model.

use clap::{Args, Parser, Subcommand, ValueEnum};
use jms_merger::{
    compile_model, load_model_file, load_models, save_models, LodCutoffs, LodLevel, LoadedModel,
    ManifestCompiler, MergedModel, OptimizeLevel, PipelineConfig, ShaderType,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jms-merger")]
#[command(author, version, about = "Merge per-LOD JMS models into one model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the merged model for a models directory (or a single model file)
    Info {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Merge a models directory and compile it
    Compile {
        #[command(flatten)]
        source: SourceArgs,

        /// Data root passed to the compiler
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Superhigh LOD cutoff (defaults to the existing model's)
        #[arg(long)]
        superhigh_cutoff: Option<String>,

        /// High LOD cutoff
        #[arg(long)]
        high_cutoff: Option<String>,

        /// Medium LOD cutoff
        #[arg(long)]
        medium_cutoff: Option<String>,

        /// Low LOD cutoff
        #[arg(long)]
        low_cutoff: Option<String>,

        /// Superlow LOD cutoff
        #[arg(long)]
        superlow_cutoff: Option<String>,

        /// Shader overrides as material=shader_type:path (e.g., "hull=shader_model:vehicles\crate\shaders\hull")
        #[arg(short, long, value_parser = parse_shader)]
        shader: Vec<(String, ShaderType, String)>,
    },

    /// Write the merged meshes back out as JMS files
    Save {
        #[command(flatten)]
        source: SourceArgs,

        /// Directory to write to (defaults to the models directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Directory holding the JMS/OBJ model sources
    #[arg(short, long)]
    models_dir: PathBuf,

    /// Compiled model path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tags root that shader paths are relative to
    #[arg(short, long)]
    tags_dir: Option<PathBuf>,

    /// Vertex welding
    #[arg(long, value_enum, default_value = "none")]
    optimize: OptimizeArg,
}

impl SourceArgs {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(&self.models_dir).with_optimize(self.optimize.into());
        if let Some(output) = &self.output {
            config = config.with_output_path(output);
        }
        if let Some(tags_dir) = &self.tags_dir {
            config = config.with_tags_dir(tags_dir);
        }
        config
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OptimizeArg {
    /// Keep every vertex
    None,
    /// Weld bit-identical vertices
    Exact,
    /// Weld vertices within a small tolerance
    Loose,
}

impl From<OptimizeArg> for OptimizeLevel {
    fn from(arg: OptimizeArg) -> Self {
        match arg {
            OptimizeArg::None => OptimizeLevel::None,
            OptimizeArg::Exact => OptimizeLevel::Exact,
            OptimizeArg::Loose => OptimizeLevel::Loose,
        }
    }
}

fn parse_shader(s: &str) -> Result<(String, ShaderType, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid shader format: '{}'. Use material=shader_type:path", s));
    }
    let (shader_type, path) = parts[1]
        .split_once(':')
        .ok_or_else(|| format!("Invalid shader format: '{}'. Use material=shader_type:path", s))?;
    let shader_type = ShaderType::from_tag_class(shader_type)
        .ok_or_else(|| format!("Unknown shader type: '{}'", shader_type))?;
    Ok((parts[0].to_string(), shader_type, path.to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { source } => {
            if source.models_dir.is_file() {
                let mesh = load_model_file(&source.models_dir)?;
                println!("\nModel {:?}:", mesh.name);
                println!("  Permutation: {}", mesh.permutation_name);
                println!("  LOD: {}", mesh.lod_level);
                println!("  Nodes: {}", mesh.nodes.len());
                println!("  Materials: {}", mesh.materials.len());
                println!("  Regions: {}", mesh.regions.len());
                println!("  Vertices: {}", mesh.vertex_count());
                println!("  Triangles: {}", mesh.triangle_count());
            } else {
                let loaded = load_models(&source.config())?;
                report_load(&loaded);
                show_model_info(&loaded.model, &loaded.lod_cutoffs);
            }
        }
        Commands::Compile {
            source,
            data_dir,
            superhigh_cutoff,
            high_cutoff,
            medium_cutoff,
            low_cutoff,
            superlow_cutoff,
            shader,
        } => {
            let mut config = source.config();
            if let Some(data_dir) = data_dir {
                config = config.with_data_dir(data_dir);
            }

            let mut loaded = load_models(&config)?;
            report_load(&loaded);
            if loaded.has_errors() {
                return Err("Merge reported errors; fix them before compiling".into());
            }

            for (material, shader_type, path) in &shader {
                loaded.model.set_shader(material, *shader_type, path)?;
            }

            let current = loaded.lod_cutoffs;
            let entered: Vec<String> = [
                (superhigh_cutoff, LodLevel::Superhigh),
                (high_cutoff, LodLevel::High),
                (medium_cutoff, LodLevel::Medium),
                (low_cutoff, LodLevel::Low),
                (superlow_cutoff, LodLevel::Superlow),
            ]
            .into_iter()
            .map(|(value, lod)| value.unwrap_or_else(|| current.get(lod).to_string()))
            .collect();
            let cutoffs = LodCutoffs::parse([
                entered[0].as_str(),
                entered[1].as_str(),
                entered[2].as_str(),
                entered[3].as_str(),
                entered[4].as_str(),
            ])?;

            let output = compile_model(&loaded, cutoffs, &config, &ManifestCompiler)?;
            println!("Compiled {} meshes to {:?}", loaded.model.mesh_count(), output);
        }
        Commands::Save { source, out_dir } => {
            let loaded = load_models(&source.config())?;
            report_load(&loaded);
            let out_dir = out_dir.unwrap_or_else(|| source.models_dir.clone());
            let written = save_models(&loaded.model, &out_dir)?;
            println!("Saved {} JMS files to {:?}", written.len(), out_dir);
        }
    }

    Ok(())
}

fn report_load(loaded: &LoadedModel) {
    for skipped in &loaded.skipped {
        println!("Skipped {:?}: {}", skipped.path, skipped.error);
    }
    for issue in &loaded.issues {
        let kind = if issue.is_warning() { "Warning" } else { "Error" };
        println!("{}: {}", kind, issue);
    }
    if loaded.existing_loaded {
        println!("Shaders and LOD cutoffs taken from the existing compiled model");
    }
}

fn show_model_info(model: &MergedModel, cutoffs: &LodCutoffs) {
    println!("\nMerged Model Info:");
    println!("  Node list checksum: {}", model.node_list_checksum);

    println!("  Nodes: {}", model.nodes.len());
    for node in &model.nodes {
        println!("    - {}", node.name);
    }

    println!("  Materials: {}", model.materials.len());
    for material in &model.materials {
        let shader_type = material
            .shader_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "<unresolved>".to_string());
        println!("    - {} ({} {})", material.name, shader_type, material.shader_path);
    }

    println!("  Regions: {}", model.regions.len());
    for region in &model.regions {
        println!("    - {}", region);
    }

    println!("  Geometries: {}", model.mesh_count());
    for (permutation, ladder) in &model.permutations {
        for (lod, mesh) in ladder.iter() {
            println!(
                "    - {} {} (from {}, cutoff {}): {} vertices, {} triangles",
                permutation,
                lod,
                mesh.source_lod,
                cutoffs.get(lod),
                mesh.vertices.len(),
                mesh.triangles.len()
            );
        }
    }
}
