//! CAD Tree Viewer
//!
//! Interactive host for the tree state engine built on egui:
//! - Collapsible assembly tree with one icon column per channel
//! - Clicks routed to the engine, published tables written to a state file
//! - Optional inbound state file polled for externally pushed tables
//! - Light/Dark icon themes with persistent preference
//!
//! The application is built with a modular architecture:
//! - `app/` - egui renderer, file-backed sync, theme persistence
//! - `ui/` - header, tree panel and status bar rendering

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::anyhow;
use cadtree::{load_document, EngineConfig, TreeStateEngine, WidgetDocument};
use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod app;
mod ui;

use app::{EguiIconRenderer, FileSync, StateFileWatcher, ThemeCoordinator};
use ui::header::HeaderInteraction;
use ui::{header, status_bar, tree_panel};

#[derive(Debug, Parser)]
#[command(name = "cadtree-viewer", about = "Interactive CAD assembly tree")]
struct Args {
    /// Widget document (`{channels?, tree, state}`), optionally `.br` compressed
    document: String,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where published state tables are written (default: `<document>.state.json`)
    #[arg(long)]
    out: Option<String>,

    /// State table file to watch for external changes
    #[arg(long)]
    watch: Option<String>,
}

/// Main application entry point that loads the document and launches the viewer.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = EngineConfig::load_or_default(args.config.as_deref())?;
    let doc = load_document(&args.document)?;
    let out = args
        .out
        .unwrap_or_else(|| format!("{}.state.json", args.document));
    let watch = args.watch;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 800.0])
            .with_title("CAD Tree"),
        ..Default::default()
    };

    eframe::run_native(
        "CAD Tree",
        options,
        Box::new(move |cc| Ok(Box::new(CadTreeApp::new(cc, &doc, config, out, watch)))),
    )
    .map_err(|e| anyhow!("viewer terminated with an error: {}", e))
}

struct CadTreeApp {
    engine: TreeStateEngine<EguiIconRenderer, FileSync>,
    themes: cadtree::ThemeManager,
    watcher: Option<StateFileWatcher>,
    config: EngineConfig,
    /// Last warning shown in the status bar
    message: Option<String>,
}

impl CadTreeApp {
    fn new(
        cc: &eframe::CreationContext,
        doc: &WidgetDocument,
        config: EngineConfig,
        out: String,
        watch: Option<String>,
    ) -> Self {
        let renderer = EguiIconRenderer::new(cc.egui_ctx.clone());
        let engine = TreeStateEngine::from_document(doc, &config, renderer, FileSync::new(out));

        let mut themes = cadtree::ThemeManager::new();
        let theme_name = ThemeCoordinator::load_theme_from_storage(cc.storage, &config.theme);
        if let Err(e) = themes.set_current_theme(&theme_name) {
            tracing::warn!(error = %e, "falling back to default theme");
        }

        let interval = Duration::from_millis(config.poll_interval_ms);
        let watcher = watch.map(|path| StateFileWatcher::new(path, interval));

        let mut app = Self {
            engine,
            themes,
            watcher,
            config,
            message: None,
        };
        app.collect_diagnostics();
        app
    }

    /// Moves engine diagnostics into the status line; they are already logged.
    fn collect_diagnostics(&mut self) {
        if let Some(last) = self.engine.take_diagnostics().pop() {
            self.message = Some(last.error.to_string());
        }
    }

    fn poll_external_state(&mut self, ctx: &egui::Context) {
        let Some(watcher) = &mut self.watcher else {
            return;
        };
        if let Some(table) = watcher.poll() {
            let changes = self.engine.apply_external_state_change(table);
            tracing::info!(changes = changes.len(), "external state applied");
        }
        ctx.request_repaint_after(watcher.interval());
    }

    fn handle_click(&mut self, node_type: &str, id: &str, channel: usize) {
        if let Err(e) = self.engine.handle_click(node_type, id, channel) {
            self.message = Some(e.to_string());
        }
    }

    fn handle_header_interaction(&mut self, interaction: HeaderInteraction) {
        match interaction {
            HeaderInteraction::ThemeSelected(name) => {
                if let Err(e) = self.themes.set_current_theme(&name) {
                    self.message = Some(e);
                }
            }
            HeaderInteraction::ToggleAllRequested(channel) => {
                let root = self.engine.root();
                let (node_type, id) = (root.kind.type_name(), root.id.clone());
                self.handle_click(node_type, &id, channel);
            }
        }
    }
}

impl eframe::App for CadTreeApp {
    /// Called when the app is being shut down - ensures preferences are saved.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        ThemeCoordinator::save_theme_to_storage(storage, self.themes.current_theme_name());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ThemeCoordinator::apply_current_theme(ctx, &self.themes);
        self.poll_external_state(ctx);

        let theme = self.themes.current_theme().clone();

        let mut header_interaction = None;
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            header_interaction =
                header::render_header(ui, &self.themes, &theme, self.engine.channel_count());
        });

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            status_bar::render_status_bar(ui, &self.engine, &theme, self.message.as_deref());
        });

        let mut clicks = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            clicks = tree_panel::render_tree_panel(
                ui,
                self.engine.root(),
                self.engine.renderer(),
                &theme,
                self.config.mark_broken_nodes,
            );
        });

        if let Some(interaction) = header_interaction {
            self.handle_header_interaction(interaction);
        }
        for click in clicks {
            self.handle_click(click.node_type, &click.id, click.channel);
        }
        self.collect_diagnostics();
    }
}
