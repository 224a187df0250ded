// Image Compressor panel
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::Arc;

use iced::font::{Family, Weight};
use iced::widget::{button, column, container, progress_bar, radio, row, scrollable, slider, text, text_input, Space};
use iced::{executor, theme, window, Application, Color, Command, Element, Event, Font, Length, Settings, Subscription, Theme};

use image_compressor_panel::config::{DEFAULT_QUALITY_PERCENT, DROP_SETTLE};
use image_compressor_panel::download::DownloadReport;
use image_compressor_panel::intake::DropGesture;
use image_compressor_panel::orchestrator::{self, Job, Step};
use image_compressor_panel::presenter::{format_bytes, RatioClass, Row, RowLog};
use image_compressor_panel::{
    intake, logging, Compressor, DirectorySink, DownloadDispatcher, ImageCompressor, LedgerEntry,
    Orchestrator, RawSettings, SelectedFile,
};

const HEADING_FONT: Font = Font {
    family: Family::SansSerif,
    weight: Weight::Bold,
    stretch: iced::font::Stretch::Normal,
    monospaced: false,
};

const BODY_FONT: Font = Font {
    family: Family::SansSerif,
    weight: Weight::Normal,
    stretch: iced::font::Stretch::Normal,
    monospaced: false,
};

const ERROR_COLOR: Color = Color::from_rgb(0.906, 0.298, 0.235);

const DEFAULT_OUTPUT_DIR: &str = "compressed";

/// Simple compresses by quality only; Advanced also bounds the dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CompressionMode {
    #[default]
    Simple,
    Advanced,
}

pub fn main() -> iced::Result {
    if let Err(e) = logging::init() {
        eprintln!("logging unavailable: {e}");
    }

    CompressorPanel::run(Settings {
        window: iced::window::Settings {
            size: (420, 680),
            min_size: Some((380, 560)),
            resizable: true,
            decorations: true,
            ..Default::default()
        },
        default_font: BODY_FONT,
        default_text_size: 14.0,
        ..Default::default()
    })
}

struct CompressorPanel {
    orchestrator: Orchestrator,
    compressor: Arc<dyn Compressor>,
    output_dir: PathBuf,
    mode: CompressionMode,
    quality_slider: u8,
    max_width: String,
    max_height: String,
    drops: DropGesture,
    rows: RowLog,
    status_message: String,
}

#[derive(Debug, Clone)]
enum Message {
    SelectFiles,
    SelectFolder,
    FilesLoaded(Vec<SelectedFile>),
    FileHovered,
    FileDropped(PathBuf),
    DropSettled(u64),
    ModeChanged(CompressionMode),
    QualityChanged(u8),
    WidthChanged(String),
    HeightChanged(String),
    Compress,
    FileCompressed(LedgerEntry),
    Download(usize),
    DownloadAll,
    DownloadsFinished { failed: Vec<String>, total: usize },
    SelectOutputFolder,
    OutputFolderChosen(Option<PathBuf>),
    OpenOutputFolder,
    NoticeClosed,
}

impl CompressorPanel {
    fn raw_settings(&self) -> RawSettings {
        RawSettings {
            quality_percent: self.quality_slider.to_string(),
            limit_dimensions: self.mode == CompressionMode::Advanced,
            max_width: self.max_width.clone(),
            max_height: self.max_height.clone(),
        }
    }

    fn apply_selection(&mut self, files: Vec<SelectedFile>) -> Command<Message> {
        match self.orchestrator.select(files) {
            Ok(count) => {
                self.status_message = format!("{count} file(s) selected");
                Command::none()
            }
            Err(e) => notify(e.to_string()),
        }
    }

    fn dispatch(&self, job: Job) -> Command<Message> {
        Command::perform(
            orchestrator::invoke(self.compressor.clone(), job),
            Message::FileCompressed,
        )
    }

    fn progress(&self) -> f32 {
        match self.orchestrator.progress() {
            Some((done, total)) if total > 0 => done as f32 / total as f32,
            Some(_) => 0.0,
            None if self.orchestrator.ledger().is_empty() => 0.0,
            None => 1.0,
        }
    }
}

impl Application for CompressorPanel {
    type Message = Message;
    type Theme = Theme;
    type Executor = executor::Default;
    type Flags = ();

    fn new(_flags: ()) -> (Self, Command<Message>) {
        let output_dir = PathBuf::from(DEFAULT_OUTPUT_DIR);
        let downloads = DownloadDispatcher::new(Arc::new(DirectorySink::new(&output_dir)));
        let defaults = RawSettings::default();
        let app = Self {
            orchestrator: Orchestrator::new(downloads),
            compressor: Arc::new(ImageCompressor::new()),
            output_dir,
            mode: CompressionMode::default(),
            quality_slider: DEFAULT_QUALITY_PERCENT,
            max_width: defaults.max_width,
            max_height: defaults.max_height,
            drops: DropGesture::new(),
            rows: RowLog::default(),
            status_message: String::new(),
        };
        (app, Command::none())
    }

    fn title(&self) -> String {
        String::from("Image Compressor")
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::SelectFiles => {
                return Command::perform(select_files(), Message::FilesLoaded);
            }
            Message::SelectFolder => {
                return Command::perform(select_folder(), Message::FilesLoaded);
            }
            Message::FilesLoaded(files) => {
                // Cancelled dialogs come back empty.
                if !files.is_empty() {
                    return self.apply_selection(files);
                }
            }
            Message::FileHovered => {
                self.drops.hovered();
            }
            Message::FileDropped(path) => {
                let ticket = self.drops.dropped(path);
                return Command::perform(tokio::time::sleep(DROP_SETTLE), move |_| {
                    Message::DropSettled(ticket)
                });
            }
            Message::DropSettled(ticket) => {
                if let Some(paths) = self.drops.settle(ticket) {
                    return Command::perform(load_paths(paths), Message::FilesLoaded);
                }
            }
            Message::ModeChanged(mode) => {
                self.mode = mode;
            }
            Message::QualityChanged(quality) => {
                self.quality_slider = quality;
            }
            Message::WidthChanged(value) => {
                self.max_width = value;
            }
            Message::HeightChanged(value) => {
                self.max_height = value;
            }
            Message::Compress => match self.orchestrator.start(&self.raw_settings()) {
                Ok(job) => {
                    self.rows.clear();
                    self.status_message = String::from("Compressing images...");
                    return self.dispatch(job);
                }
                Err(e) => {
                    self.status_message.clear();
                    return notify(e.to_string());
                }
            },
            Message::FileCompressed(entry) => match self.orchestrator.record(entry, &mut self.rows) {
                Step::Next(job) => return self.dispatch(job),
                Step::Finished(summary) => {
                    self.status_message = if summary.failed > 0 {
                        format!("Processed {} images, {} failed", summary.total(), summary.failed)
                    } else {
                        format!("Processed {} images", summary.total())
                    };
                }
            },
            Message::Download(index) => match self.orchestrator.download_one(index) {
                Ok(path) => {
                    self.status_message = format!("Saved {}", path.display());
                }
                Err(e) => return notify(e.to_string()),
            },
            Message::DownloadAll => match self.orchestrator.download_all() {
                Ok(schedule) => {
                    let count = self.orchestrator.ledger().results().count();
                    self.status_message = format!("Downloading {count} file(s)...");
                    return Command::batch([
                        Command::perform(schedule, |reports: Vec<DownloadReport>| {
                            Message::DownloadsFinished {
                                total: reports.len(),
                                failed: reports
                                    .into_iter()
                                    .filter(|r| !r.succeeded())
                                    .map(|r| r.filename)
                                    .collect(),
                            }
                        }),
                        notify(format!("Started downloading {count} file(s)")),
                    ]);
                }
                Err(e) => return notify(e.to_string()),
            },
            Message::DownloadsFinished { failed, total } => {
                self.status_message = if failed.is_empty() {
                    format!("Saved {total} file(s) to {}", self.output_dir.display())
                } else {
                    format!(
                        "Saved {} of {total} file(s), failed: {}",
                        total - failed.len(),
                        failed.join(", ")
                    )
                };
            }
            Message::SelectOutputFolder => {
                return Command::perform(select_output_folder(), Message::OutputFolderChosen);
            }
            Message::OutputFolderChosen(Some(dir)) => {
                self.orchestrator
                    .set_downloads(DownloadDispatcher::new(Arc::new(DirectorySink::new(&dir))));
                self.output_dir = dir;
            }
            Message::OutputFolderChosen(None) | Message::NoticeClosed => {}
            Message::OpenOutputFolder => {
                if self.output_dir.exists() {
                    if let Err(e) = open::that(&self.output_dir) {
                        log::warn!("could not open {}: {e}", self.output_dir.display());
                    }
                }
            }
        }
        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::subscription::events_with(|event, _status| match event {
            Event::Window(window::Event::FileHovered(_)) => Some(Message::FileHovered),
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }

    fn view(&self) -> Element<Message> {
        let title = text("Image Compressor")
            .size(22)
            .font(HEADING_FONT);

        // File selection
        let batch = self.orchestrator.batch();
        let file_selection = column![
            text("Select Images")
                .size(16)
                .font(HEADING_FONT),
            row![
                button("Select Files")
                    .on_press(Message::SelectFiles)
                    .padding([6, 12]),
                button("Select Folder")
                    .on_press(Message::SelectFolder)
                    .padding([6, 12]),
            ].spacing(8),
            if batch.is_empty() {
                text("Drop images here or click to select (JPG, PNG, WebP)")
                    .size(12)
                    .font(BODY_FONT)
            } else {
                let total: u64 = batch.iter().map(SelectedFile::size).sum();
                text(format!("{} file(s) selected, {}", batch.len(), format_bytes(total)))
                    .size(12)
                    .font(BODY_FONT)
            }
        ].spacing(8);

        // Mode selection
        let mode_selection = row![
            radio(
                "Simple",
                CompressionMode::Simple,
                Some(self.mode),
                Message::ModeChanged,
            ).size(13).spacing(8),
            Space::with_width(20),
            radio(
                "Advanced",
                CompressionMode::Advanced,
                Some(self.mode),
                Message::ModeChanged,
            ).size(13).spacing(8),
        ].spacing(12);

        // Quality and, in advanced mode, the dimension bound
        let settings = column![
            text("Compression Settings")
                .size(16)
                .font(HEADING_FONT),
            mode_selection,
            row![
                text("Quality:")
                    .size(13)
                    .font(BODY_FONT)
                    .width(80),
                slider(10..=100, self.quality_slider, Message::QualityChanged)
                    .width(Length::Fill),
                text(format!("{}%", self.quality_slider))
                    .size(13)
                    .font(BODY_FONT)
                    .width(40),
            ].spacing(8),
            if self.mode == CompressionMode::Advanced {
                column![
                    row![
                        text("Max size:")
                            .size(13)
                            .font(BODY_FONT)
                            .width(80),
                        text_input("W", &self.max_width)
                            .on_input(Message::WidthChanged)
                            .width(Length::Fixed(65.0))
                            .padding(4)
                            .size(13),
                        text("×")
                            .size(13)
                            .font(BODY_FONT),
                        text_input("H", &self.max_height)
                            .on_input(Message::HeightChanged)
                            .width(Length::Fixed(65.0))
                            .padding(4)
                            .size(13),
                        text("px")
                            .size(13)
                            .font(BODY_FONT),
                    ].spacing(6),
                ]
            } else {
                column![]
            },
        ].spacing(8);

        // Compress button
        let compress_button = if self.orchestrator.is_running() {
            button("Compressing...")
                .padding([8, 16])
        } else if !batch.is_empty() {
            button("Compress Images")
                .on_press(Message::Compress)
                .padding([8, 16])
        } else {
            button("Compress Images")
                .padding([8, 16])
        };

        // Progress
        let progress_section = if self.orchestrator.is_running() || !self.status_message.is_empty() {
            column![
                progress_bar(0.0..=1.0, self.progress())
                    .height(Length::Fixed(6.0)),
                text(&self.status_message)
                    .size(12)
                    .font(BODY_FONT),
            ].spacing(4)
        } else {
            column![]
        };

        // Results
        let ledger = self.orchestrator.ledger();
        let results_section = if !self.rows.rows.is_empty() {
            let results_list: Vec<Element<Message>> = self
                .rows
                .rows
                .iter()
                .map(|(index, line)| result_row(*index, line.clone()))
                .collect();

            let download_all = if ledger.has_successes() {
                button("Download All")
                    .on_press(Message::DownloadAll)
                    .padding([6, 12])
            } else {
                button("Download All")
                    .padding([6, 12])
            };

            column![
                text("Results")
                    .size(16)
                    .font(HEADING_FONT),
                container(
                    scrollable(
                        column(results_list).spacing(3)
                    ).height(Length::Fixed(220.0))
                )
                .style(iced::theme::Container::Box)
                .padding(8),
                row![
                    download_all,
                    button("Output Folder...")
                        .on_press(Message::SelectOutputFolder)
                        .padding([6, 12]),
                    button("Open Output")
                        .on_press(Message::OpenOutputFolder)
                        .padding([6, 12]),
                ].spacing(8),
                text(format!("Saving to {}", self.output_dir.display()))
                    .size(11)
                    .font(BODY_FONT),
            ].spacing(8)
        } else {
            column![]
        };

        let content = column![
            title,
            Space::with_height(12),
            file_selection,
            Space::with_height(12),
            settings,
            Space::with_height(12),
            compress_button,
            Space::with_height(8),
            progress_section,
            if !self.rows.rows.is_empty() {
                Space::with_height(12)
            } else {
                Space::with_height(0)
            },
            results_section,
        ]
        .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn ratio_color(class: RatioClass) -> Color {
    match class {
        RatioClass::Good => Color::from_rgb(0.153, 0.682, 0.376),
        RatioClass::Average => Color::from_rgb(0.953, 0.612, 0.071),
        RatioClass::Poor => Color::from_rgb(0.584, 0.647, 0.651),
    }
}

fn result_row<'a>(index: usize, line: Row) -> Element<'a, Message> {
    match line {
        Row::Result { name, sizes, saving, class } => row![
            column![
                text(name)
                    .size(12)
                    .font(HEADING_FONT),
                text(sizes)
                    .size(12)
                    .font(BODY_FONT),
            ].width(Length::Fill),
            text(saving)
                .size(12)
                .style(theme::Text::Color(ratio_color(class))),
            button("Download")
                .on_press(Message::Download(index))
                .padding([4, 10]),
        ].spacing(8).into(),
        Row::Error { name, message } => column![
            text(name)
                .size(12)
                .font(HEADING_FONT)
                .style(theme::Text::Color(ERROR_COLOR)),
            text(message)
                .size(11)
                .font(BODY_FONT)
                .style(theme::Text::Color(ERROR_COLOR)),
        ].into(),
    }
}

fn notify(message: String) -> Command<Message> {
    Command::perform(show_notice(message), |_| Message::NoticeClosed)
}

async fn show_notice(message: String) {
    let _ = rfd::AsyncMessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title("Image Compressor")
        .set_description(&message)
        .show()
        .await;
}

// Helper functions
async fn load_paths(paths: Vec<PathBuf>) -> Vec<SelectedFile> {
    tokio::task::spawn_blocking(move || intake::load_files(&paths))
        .await
        .unwrap_or_default()
}

async fn select_files() -> Vec<SelectedFile> {
    let picked = rfd::AsyncFileDialog::new()
        .add_filter("Images", &["jpg", "jpeg", "png", "gif", "bmp", "webp"])
        .pick_files()
        .await
        .unwrap_or_default();
    let paths = picked.iter().map(|handle| handle.path().to_path_buf()).collect();
    load_paths(paths).await
}

async fn select_folder() -> Vec<SelectedFile> {
    let Some(folder) = rfd::AsyncFileDialog::new().pick_folder().await else {
        return Vec::new();
    };
    let root = folder.path().to_path_buf();
    tokio::task::spawn_blocking(move || intake::load_files(&intake::collect_paths(&root)))
        .await
        .unwrap_or_default()
}

async fn select_output_folder() -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .pick_folder()
        .await
        .map(|handle| handle.path().to_path_buf())
}
