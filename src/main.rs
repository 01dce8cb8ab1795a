//! Chart Terminal - Main Application Entry Point
//!
//! Interactive OHLC chart with trendline drawing, rendered with egui.

use chrono::Utc;
use eframe::egui;
use std::error::Error;
use tracing::{info, warn};

use chart_terminal::terminal::{
    create_datafeed, init_logger, ChartConfig, RefreshSchedule, RefreshWorker, Settings,
};
use chart_terminal::ChartWidget;

/// Application state holding the chart and its data pipeline
struct ChartTerminalApp {
    settings: Settings,
    config: ChartConfig,
    chart: ChartWidget,
    worker: RefreshWorker,
    schedule: RefreshSchedule,
}

impl ChartTerminalApp {
    fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let runtime = tokio::runtime::Handle::current();
        let config = ChartConfig::from_settings(&settings);
        let feed = create_datafeed(&settings);
        info!(datafeed = feed.name(), symbol = %config.symbol, timeframe = %config.timeframe, "chart terminal ready");

        Self {
            chart: ChartWidget::new(&config),
            worker: RefreshWorker::new(runtime, feed),
            schedule: RefreshSchedule::new(config.refresh_minutes, Utc::now()),
            settings,
            config,
        }
    }

    /// Issue queries for toolbar changes and scheduled refreshes, then
    /// apply whatever arrived since the last frame.
    fn process_refresh(&mut self) {
        if let Some(request) = self.chart.take_reload_request() {
            self.worker.request(request);
        } else if self.schedule.poll(Utc::now()) {
            info!(next = %self.schedule.next(), "scheduled refresh");
            self.worker.request(self.chart.request());
        }

        if let Some(result) = self.worker.try_recv() {
            if result.bars.is_empty() {
                // Nothing fetched this cycle, keep what is on screen
                return;
            }
            if let Err(e) = self.chart.controller_mut().replace_series(result.bars) {
                warn!(symbol = %result.request.symbol, "rejected series: {}", e);
            }
        }
    }
}

impl eframe::App for ChartTerminalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_refresh();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart.show(ui);
        });

        // Wake up for the next refresh even when idle
        let until_refresh = self.schedule.time_until(Utc::now());
        ctx.request_repaint_after(until_refresh.min(std::time::Duration::from_millis(250)));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.chart.config(&self.config).apply_to(&self.settings);
        match self.settings.save() {
            Ok(()) => info!("chart settings saved"),
            Err(e) => warn!("failed to save chart settings: {}", e),
        }
    }
}

/// Create native window options
fn create_native_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Chart Terminal")
            .with_inner_size([1200.0, 760.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Datafeed queries run on this runtime while eframe owns the main thread
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let settings = Settings::new();
    if !init_logger(&settings) {
        eprintln!("logger already initialized");
    }

    info!("starting chart terminal {}", chart_terminal::VERSION);
    info!("rust version: {}", rustc_version_runtime::version());

    eframe::run_native(
        "Chart Terminal",
        create_native_options(),
        Box::new(|cc| Ok(Box::new(ChartTerminalApp::new(cc, settings)))),
    )
    .map_err(|e| format!("Failed to run application: {}", e))?;

    Ok(())
}
