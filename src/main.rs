//! Headless reader: walks page images panel by panel from line commands on
//! stdin and prints what a display would show.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::io::BufRead;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use anyhow::{Context, bail};
    use clap::Parser;

    use komawari::config::{AppConfig, LogLevel};
    use komawari::data::{FolderPageLoader, FullPageDetector, ManifestDetector, PageSources, PanelDetector};
    use komawari::keybindings::KeyCode;
    use komawari::model::{Panel, Size};
    use komawari::render::{DisplayMetrics, OverlayLayer, OverlayVisibility, RenderSink};
    use komawari::zoom_math::ViewportTransform;
    use komawari::{Command, NavError, Navigator, Transition};

    const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Panel-by-panel manga reader")]
    struct Args {
        /// Page images or folders of page images
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Configuration file (defaults to the user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Detector manifest with precomputed panels
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Viewport size as WIDTHxHEIGHT
        #[arg(long, default_value = "800x1200", value_parser = parse_size)]
        viewport: Size,

        /// Rendered image size as WIDTHxHEIGHT (defaults to the viewport)
        #[arg(long, value_parser = parse_size)]
        rendered: Option<Size>,

        /// Log level (error, warn, info, debug, trace)
        #[arg(long, value_parser = parse_log_level)]
        log_level: Option<LogLevel>,

        /// Swap the arrow keys for right-to-left reading
        #[arg(long)]
        rtl_arrows: bool,

        /// Write the configuration in use back to the config file
        #[arg(long)]
        save_config: bool,
    }

    fn parse_size(s: &str) -> Result<Size, String> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width: f64 = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
        let height: f64 = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
        let size = Size::new(width, height);
        if !size.is_positive() {
            return Err(format!("size must be positive, got {s:?}"));
        }
        Ok(size)
    }

    fn parse_log_level(s: &str) -> Result<LogLevel, String> {
        LogLevel::from_name(s).ok_or_else(|| format!("unknown log level {s:?}"))
    }

    /// Prints every display change to stdout.
    struct TerminalSink {
        layer: OverlayLayer,
        metrics: DisplayMetrics,
    }

    impl TerminalSink {
        fn print_overlays(&self) {
            for (index, rect, visibility) in self.layer.iter() {
                let marker = match visibility {
                    OverlayVisibility::Visible => " ",
                    OverlayVisibility::Active => "*",
                    OverlayVisibility::Hidden => continue,
                };
                println!(
                    "  {}[{}] left {:.1}% top {:.1}% width {:.1}% height {:.1}%",
                    marker, index, rect.left_pct, rect.top_pct, rect.width_pct, rect.height_pct
                );
            }
        }
    }

    impl RenderSink for TerminalSink {
        fn draw_overlays(&mut self, panels: &[Panel], natural_size: Size) {
            self.layer.draw(panels, natural_size);
            println!(
                "overlays: {} panels on a {}x{} page",
                panels.len(),
                natural_size.width,
                natural_size.height
            );
            self.print_overlays();
        }

        fn apply_transform(&mut self, transform: ViewportTransform) {
            if transform.is_identity() {
                println!("transform: identity");
            } else {
                println!(
                    "transform: translate({:.2}px, {:.2}px) scale({:.4})",
                    transform.translate_x, transform.translate_y, transform.scale
                );
            }
        }

        fn set_active_panel(&mut self, index: Option<usize>) {
            self.layer.set_active(index);
            if index.is_some() {
                self.print_overlays();
            }
        }

        fn metrics(&self) -> DisplayMetrics {
            self.metrics
        }
    }

    type Reader = Navigator<FolderPageLoader, TerminalSink>;

    pub fn run() -> anyhow::Result<()> {
        let args = Args::parse();

        let config = match &args.config {
            Some(path) => AppConfig::load_from(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => AppConfig::load_from_default_path().unwrap_or_default(),
        };

        let level = args.log_level.unwrap_or(config.preferences.log_level);
        env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .init();

        if args.save_config {
            let saved = match &args.config {
                Some(path) => config.save_to(path),
                None => config.save_to_default_path(),
            };
            saved.context("Failed to save config")?;
        }

        let sources = PageSources::from_paths(&args.paths).context("No pages to read")?;
        let detector = open_detector(&args, &config, &sources)?;
        let loader = FolderPageLoader::spawn(sources, detector, config.detector)
            .context("Failed to start page loader")?;

        let sink = TerminalSink {
            layer: OverlayLayer::new(),
            metrics: DisplayMetrics {
                rendered: args.rendered.unwrap_or(args.viewport),
                viewport: args.viewport,
            },
        };
        let mut keybindings = config.keybindings.clone();
        if args.rtl_arrows {
            keybindings = keybindings.mirrored_arrows();
        }

        let mut reader = Navigator::new(loader, sink).with_preload_count(config.preferences.preload_count);
        println!("{} pages; type 'help' for commands", reader.sequence_len());
        apply(&mut reader, Command::LoadPage(0));

        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("Failed to read stdin")?;
            let words: Vec<&str> = line.split_whitespace().collect();
            let command = match words.as_slice() {
                [] => continue,
                ["q" | "quit"] => break,
                ["help"] => {
                    print_help(&keybindings);
                    continue;
                }
                ["next"] => Command::NextPanel,
                ["prev" | "previous"] => Command::PreviousPanel,
                ["dezoom"] => Command::Dezoom,
                ["page" | "g", n] => match n.parse() {
                    Ok(page) => Command::LoadPage(page),
                    Err(_) => {
                        println!("not a page number: {}", n);
                        continue;
                    }
                },
                ["zoom" | "z", n] => match n.parse() {
                    Ok(panel) => Command::ZoomTo(panel),
                    Err(_) => {
                        println!("not a panel number: {}", n);
                        continue;
                    }
                },
                ["click" | "c", x, y] => {
                    match (x.parse(), y.parse()) {
                        (Ok(x), Ok(y)) => report(reader.click(x, y)),
                        _ => println!("usage: click X Y"),
                    }
                    finish_loads(&mut reader);
                    continue;
                }
                [key] => match KeyCode::from_name(key).and_then(|k| keybindings.command_for_key(k)) {
                    Some(command) => command,
                    None => {
                        println!("unknown command: {}", key);
                        continue;
                    }
                },
                _ => {
                    println!("unknown command: {}", line.trim());
                    continue;
                }
            };
            apply(&mut reader, command);
        }

        Ok(())
    }

    fn open_detector(
        args: &Args,
        config: &AppConfig,
        sources: &PageSources,
    ) -> anyhow::Result<Box<dyn PanelDetector>> {
        let manifest = args.manifest.clone().or_else(|| {
            sources
                .get(0)
                .and_then(Path::parent)
                .map(|dir| dir.join(&config.preferences.manifest_name))
                .filter(|path| path.is_file())
        });

        match manifest {
            Some(path) => {
                let detector = ManifestDetector::from_file(&path)
                    .with_context(|| format!("Failed to open manifest {:?}", path))?;
                if detector.is_empty() {
                    bail!("Manifest {:?} has no entries", path);
                }
                Ok(Box::new(detector))
            }
            None => {
                log::info!("No panel manifest found, using whole pages as panels");
                Ok(Box::new(FullPageDetector))
            }
        }
    }

    fn apply(reader: &mut Reader, command: Command) {
        report(reader.handle(command));
        finish_loads(reader);
    }

    /// Block until the page being waited on arrives, then take any preloads
    /// that are already done.
    fn finish_loads(reader: &mut Reader) {
        while let Some(page) = reader.load_target() {
            match reader.loader_mut().wait_completed(LOAD_TIMEOUT) {
                Some(completion) => report(reader.complete_load(completion)),
                None => {
                    println!("timed out waiting for page {}", page);
                    return;
                }
            }
        }
        for result in reader.pump() {
            report(result);
        }
    }

    fn report(result: Result<Transition, NavError>) {
        match result {
            Ok(Transition::Shown { page }) => println!("state: Unzoomed({})", page),
            Ok(Transition::Zoomed { page, panel }) => {
                println!("state: ZoomedOnPanel({}, {})", page, panel)
            }
            Ok(Transition::Dezoomed { page }) => println!("state: Unzoomed({})", page),
            Ok(Transition::Loading { page }) => println!("loading page {}", page),
            Ok(Transition::StaleLoadIgnored { page }) => log::debug!("page {} cached", page),
            Ok(Transition::Unchanged) => {}
            Err(e) => println!("error: {}", e),
        }
    }

    fn print_help(keybindings: &komawari::keybindings::KeyBindings) {
        let keys = |command: Command| {
            keybindings
                .keys_for(command)
                .iter()
                .map(KeyCode::name)
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("next                 next panel ({})", keys(Command::NextPanel));
        println!("prev                 previous panel ({})", keys(Command::PreviousPanel));
        println!("dezoom               whole page ({})", keys(Command::Dezoom));
        println!("page N               show page N");
        println!("zoom N               zoom on panel N");
        println!("click X Y            zoom on the panel under a rendered point");
        println!("quit");
    }
}
