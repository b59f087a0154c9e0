mod bootstrap;
mod report;

use anyhow::{Context, Result};

use linknet_core::settings::Settings;
use linknet_data::analysis::{analyze_archive, AnalysisOptions};
use linknet_graph::{
    build_graph, DotRenderer, GraphConfig, GraphRenderer, JsonRenderer, SizeScale,
};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("linknet v{} starting", env!("CARGO_PKG_VERSION"));

    let Some(archive) = &settings.archive else {
        anyhow::bail!("no archive given; pass a zip file or an extracted directory");
    };

    let options = AnalysisOptions {
        privacy: settings.privacy,
        ds_threshold: settings.ds_threshold,
        swe_threshold: settings.swe_threshold,
        denylist: settings.company_denylist.clone(),
    };
    let analysis = analyze_archive(archive, &options)
        .with_context(|| format!("failed to analyze {}", archive.display()))?;

    print!("{}", report::render(&analysis, settings.top_n as usize));

    // Relationship graph, exported in both formats.
    let graph_config = GraphConfig {
        size_scale: if settings.log_scale {
            SizeScale::Log
        } else {
            SizeScale::Linear
        },
        ..GraphConfig::new(&settings.network_column, settings.cutoff)
    };
    let graph = build_graph(&analysis.records, &graph_config);

    std::fs::create_dir_all(&settings.out_dir)?;
    for renderer in [&JsonRenderer as &dyn GraphRenderer, &DotRenderer] {
        let path = settings
            .out_dir
            .join(format!("network.{}", renderer.extension()));
        let rendered = renderer.render(&graph)?;
        std::fs::write(&path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Wrote {}", path.display());
    }

    println!(
        "\nGraph: {} nodes over \"{}\" (cutoff {}), exported to {}",
        graph.spokes().count(),
        settings.network_column,
        settings.cutoff,
        settings.out_dir.display()
    );

    Ok(())
}
