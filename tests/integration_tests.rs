//! End-to-end tests for the map and route core

use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rstest::rstest;

use tripmap::i18n::keys;
use tripmap::map::{
    InfoPayload, MapOptions, MapSurface, MapView, Marker, MarkerHandle, SceneSurface, Viewport, ViewportSettings, mount,
};
use tripmap::routing::provider::{Polyline, RouteCandidate, RouteLeg, TextValue};
use tripmap::routing::{
    DirectionsProvider, DirectionsRequest, DirectionsResponse, DirectionsStatus, ProviderError, RouteFailure,
    RoutePrecondition,
};
use tripmap::{AppContext, GroupKey, GroupingMode, Language, RouteQuery, SelectionSource, TravelMode, TripMapConfig};

/// Surface that keeps every call it receives
#[derive(Default)]
struct RecordingSurface {
    views: Vec<Viewport>,
    markers: Vec<(MarkerHandle, Marker)>,
    next: u64,
    info: Option<(MarkerHandle, InfoPayload)>,
    language_tags: Vec<String>,
}

impl MapSurface for RecordingSurface {
    fn set_view(&mut self, viewport: Viewport) {
        self.views.push(viewport);
    }

    fn add_marker(&mut self, marker: &Marker) -> MarkerHandle {
        self.next += 1;
        let handle = MarkerHandle(self.next);
        self.markers.push((handle, marker.clone()));
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.retain(|(candidate, _)| *candidate != handle);
    }

    fn open_info(&mut self, anchor: MarkerHandle, info: &InfoPayload) {
        self.info = Some((anchor, info.clone()));
    }

    fn close_info(&mut self) {
        self.info = None;
    }

    fn set_language(&mut self, tag: &str) {
        self.language_tags.push(tag.to_string());
    }
}

fn context() -> AppContext {
    AppContext::new(TripMapConfig::default()).unwrap()
}

fn scene_view(ctx: &AppContext, key: GroupKey, lang: Language) -> MapView<SceneSurface> {
    let state = mount(
        |options: &MapOptions| Ok(SceneSurface::new(options)),
        ctx.map_data(),
        ctx.viewport_settings(),
        key,
        lang,
    );
    match state {
        tripmap::MapState::Ready(view) => view,
        tripmap::MapState::Unavailable { banner } => panic!("map unavailable: {banner}"),
    }
}

#[test]
fn test_day_three_scenario() {
    let ctx = context();
    let first_place = ctx.catalog.get(1).unwrap().coordinates();

    let mut view = MapView::new(
        RecordingSurface::default(),
        ctx.map_data(),
        ViewportSettings::default(),
        GroupKey::Day(9),
        Language::En,
    )
    .unwrap();
    let views_before = view.surface().views.len();

    let outcome = view.select_group(GroupKey::Day(3)).unwrap().unwrap();

    // Recentered on the day's first resolvable place, then fitted
    let views = &view.surface().views[views_before..];
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].center, first_place);
    assert_eq!(views[0].zoom, 11);
    assert!(views[1].zoom <= 15);
    assert_eq!(outcome.anchor, Some(first_place));

    // One marker per valid id, in itinerary order
    let ids: Vec<_> = view.surface().markers.iter().map(|(_, m)| m.place_id).collect();
    assert_eq!(ids, vec![1, 12, 28, 13, 14]);

    let (third, _) = view.surface().markers[2].clone();
    let focused = view.click_marker(third).unwrap();

    let (anchor, info) = view.surface().info.clone().unwrap();
    assert_eq!(anchor, third);
    assert_eq!(info.name, "Miyahara Eye Hospital");
    assert_eq!(
        info.description,
        "Historic eye clinic from Japanese era converted into a unique dessert shop"
    );
    assert_eq!(info.address, "Taichung City");
    assert_eq!(view.selection().place, Some(28));
    assert_eq!(focused.zoom, 16);
    assert_eq!(focused.center, ctx.catalog.get(28).unwrap().coordinates());
}

#[rstest]
#[case(GroupKey::Day(2), GroupKey::Category("taipei".into()))]
#[case(GroupKey::Category("new-taipei".into()), GroupKey::Day(9))]
#[case(GroupKey::Day(7), GroupKey::Day(8))]
#[case(GroupKey::Category("taichung".into()), GroupKey::Category("taoyuan".into()))]
fn test_switch_replaces_markers(#[case] from: GroupKey, #[case] to: GroupKey) {
    let ctx = context();
    let mut view = scene_view(&ctx, from, Language::Zh);

    view.select_group(to.clone()).unwrap();

    let expected = ctx.group_index().resolve(&to).unwrap().places.len();
    assert_eq!(view.surface().marker_count(), expected);
    assert_eq!(view.markers().len(), expected);
}

#[test]
fn test_every_grouping_switch_keeps_marker_counts_exact() {
    let ctx = context();
    let index = ctx.group_index();
    let mut view = scene_view(&ctx, GroupKey::Day(1), Language::Ja);

    for mode in [GroupingMode::ByCategory, GroupingMode::ByDay] {
        for key in index.keys(mode) {
            view.rebuild(key.clone(), Language::Ja).unwrap();
            assert_eq!(
                view.surface().marker_count(),
                index.resolve(&key).unwrap().places.len(),
                "{key}"
            );
        }
    }
}

#[rstest]
#[case(Language::Zh)]
#[case(Language::En)]
#[case(Language::Ja)]
fn test_list_and_marker_selection_converge(#[case] lang: Language) {
    let ctx = context();

    let mut by_list = scene_view(&ctx, GroupKey::Day(4), lang);
    by_list.select_place(17, SelectionSource::List).unwrap();

    let mut by_marker = scene_view(&ctx, GroupKey::Day(4), lang);
    let handle = by_marker.handle_of(17).unwrap();
    by_marker.click_marker(handle).unwrap();

    assert_eq!(by_list.selection(), by_marker.selection());
    assert_eq!(by_list.viewport(), by_marker.viewport());
    assert_eq!(by_list.surface().scene(), by_marker.surface().scene());
    assert_eq!(
        by_list.surface().open_info().map(|(_, info)| info.clone()),
        by_marker.surface().open_info().map(|(_, info)| info.clone())
    );
}

#[test]
fn test_language_switch_relabels_markers() {
    let ctx = context();
    let mut view = scene_view(&ctx, GroupKey::Category("taoyuan".into()), Language::En);
    assert_eq!(view.markers()[0].1.title, "Taoyuan International Airport");

    view.set_language(Language::Ja).unwrap();
    assert_eq!(view.markers()[0].1.title, "桃園国際空港");
    assert_eq!(view.surface().marker_count(), 1);
    assert_eq!(view.surface().scene().language_tag, "ja");
}

#[test]
fn test_map_labels_reload_only_on_language_change() {
    let ctx = context();
    let mut view = MapView::new(
        RecordingSurface::default(),
        ctx.map_data(),
        ViewportSettings::default(),
        GroupKey::Day(1),
        Language::En,
    )
    .unwrap();

    view.select_group(GroupKey::Day(2)).unwrap();
    view.set_language(Language::Zh).unwrap();
    view.rebuild(GroupKey::Day(3), Language::Zh).unwrap();

    assert_eq!(view.surface().language_tags, vec!["zh-TW".to_string()]);
}

struct CountingProvider {
    status: DirectionsStatus,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new(status: DirectionsStatus) -> Arc<Self> {
        Arc::new(Self {
            status,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl DirectionsProvider for CountingProvider {
    async fn route(&self, _request: &DirectionsRequest) -> Result<DirectionsResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DirectionsResponse::with_status(self.status))
    }
}

#[rstest]
#[case("", "Ximending", RoutePrecondition::EmptyInput)]
#[case("Ximending", "  ", RoutePrecondition::EmptyInput)]
#[case("Ximending", "Ximending", RoutePrecondition::SamePlace)]
#[case("asdfgh", "Ximending", RoutePrecondition::UnknownPlace("asdfgh".into()))]
#[case("Ximending", "Ximen", RoutePrecondition::UnknownPlace("Ximen".into()))]
#[tokio::test]
async fn test_invalid_route_input_sends_no_request(
    #[case] origin: &str,
    #[case] destination: &str,
    #[case] expected: RoutePrecondition,
) {
    let ctx = context();
    let provider = CountingProvider::new(DirectionsStatus::Ok);
    let mut calculator = ctx.route_calculator();

    let result = calculator
        .calculate(provider.as_ref(), &RouteQuery::new(origin, destination, TravelMode::Driving), Language::En)
        .await;

    assert_eq!(result, Err(expected));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[case(Language::Zh, "找不到可行的路線")]
#[case(Language::En, "No route available")]
#[case(Language::Ja, "ルートが見つかりません")]
#[tokio::test]
async fn test_zero_results_shows_localized_message(#[case] lang: Language, #[case] expected: &str) {
    let ctx = context();
    let provider = CountingProvider::new(DirectionsStatus::ZeroResults);
    let mut calculator = ctx.route_calculator();
    let origin = ctx.catalog.get(2).unwrap().name.get(lang).to_string();
    let destination = ctx.catalog.get(13).unwrap().name.get(lang).to_string();

    let outcome = calculator
        .calculate(provider.as_ref(), &RouteQuery::new(origin, destination, TravelMode::Driving), lang)
        .await
        .unwrap();

    let failure = outcome.unwrap_err();
    assert_eq!(failure, RouteFailure::NoRoute);
    let message = failure.message(lang, &ctx.translator);
    assert_eq!(message, expected);
    assert!(!message.contains("ZERO_RESULTS"));
    assert!(calculator.overlay().is_none());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

struct TaichungProvider;

#[async_trait]
impl DirectionsProvider for TaichungProvider {
    async fn route(&self, request: &DirectionsRequest) -> Result<DirectionsResponse, ProviderError> {
        assert_eq!(request.language, Language::Ja);
        Ok(DirectionsResponse {
            status: DirectionsStatus::Ok,
            routes: vec![RouteCandidate {
                summary: "台12線".into(),
                legs: vec![RouteLeg {
                    distance: Some(TextValue {
                        text: "5.2 km".into(),
                        value: Some(5210.0),
                    }),
                    duration: Some(TextValue {
                        text: "1 時間20分".into(),
                        value: Some(4790.0),
                    }),
                }],
                overview_polyline: Polyline {
                    points: "abc".into(),
                },
            }],
            error_message: None,
        })
    }
}

#[tokio::test]
async fn test_route_result_renders_in_every_language() {
    let ctx = context();
    let mut calculator = ctx.route_calculator();
    let query = RouteQuery::new("宮原眼科", "逢甲ナイトマーケット", TravelMode::Driving);

    let summary = calculator
        .calculate(&TaichungProvider, &query, Language::Ja)
        .await
        .unwrap()
        .unwrap();
    assert_eq!((summary.origin, summary.destination), (28, 14));
    assert!(calculator.overlay().is_some());

    let expected = [
        (Language::En, "5.2 kilometers", "1 hour 20 minutes"),
        (Language::Zh, "5.2 公里", "1 小時 20 分鐘"),
        (Language::Ja, "5.2 キロメートル", "1 時間 20 分"),
    ];
    for (lang, distance, duration) in expected {
        let display = summary.localize(lang, &ctx.translator);
        assert_eq!(display.distance, distance);
        assert_eq!(display.duration, duration);
    }
}

#[test]
fn test_missing_entries_are_visible_in_every_language() {
    let ctx = context();
    for lang in Language::ALL {
        let view = scene_view(&ctx, GroupKey::Day(9), lang);
        let missing = view.missing();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].place_id, 41);
        assert!(missing[0].label.contains("#41"));
        assert_ne!(missing[0].label, keys::MAP_DATA_MISSING);
    }
}

fn cli(name: &str) -> Command {
    let home = std::env::temp_dir().join("tripmap-cli-tests").join(name);
    let mut command = Command::new(env!("CARGO_BIN_EXE_tripmap"));
    command
        .env("TRIPMAP_CACHE__LOCATION", home.join("cache"))
        .env("TRIPMAP_CONFIG", home.join("missing-config.toml"))
        .env_remove("RUST_LOG");
    command
}

#[test]
fn test_cli_help() {
    let output = cli("help").arg("--help").output().expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tripmap"));
    assert!(stdout.contains("route"));
}

#[test]
fn test_cli_show_flags_missing_place() {
    let output = cli("show")
        .args(["--lang", "en", "show", "day:7"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Data missing (#40)"));
    assert!(stdout.contains("Shifen Waterfall"));
}

#[test]
fn test_cli_route_rejects_identical_places() {
    let output = cli("route")
        .args(["--lang", "en", "route", "Ximending", "Ximending"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Origin and destination must differ"));
}

#[test]
fn test_cli_reports_config_errors_plainly() {
    let output = cli("bad-config")
        .env("TRIPMAP_LOGGING__LEVEL", "loud")
        .args(["groups"])
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error. Please check your config file and API keys."));
    assert!(stderr.contains("Invalid log level 'loud'"));
}
