//! Static export of map scenes for the site
//!
//! Layout of the output directory:
//!
//! ```text
//! manifest.json
//! <lang>/groups.json
//! <lang>/places.json
//! <lang>/scenes/<group>.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::context::AppContext;
use crate::i18n::Language;
use crate::index::{GroupKey, GroupingMode};
use crate::map::{ListEntry, MapOptions, MapView, MissingEntry, Scene, SceneSurface, Viewport};
use crate::map::view::TAIWAN_CENTER;
use crate::models::PlaceId;

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    version: &'a str,
    default_language: Language,
    languages: Vec<Language>,
}

#[derive(Debug, Serialize)]
struct GroupLink {
    key: GroupKey,
    label: String,
    file: String,
}

#[derive(Debug, Serialize)]
struct GroupListing {
    by_category: Vec<GroupLink>,
    by_day: Vec<GroupLink>,
}

#[derive(Debug, Serialize)]
struct PlaceName<'a> {
    id: PlaceId,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct SceneFile {
    key: GroupKey,
    label: String,
    scene: Scene,
    entries: Vec<ListEntry>,
    missing: Vec<MissingEntry>,
    no_data: Option<String>,
}

/// What an export wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub languages: usize,
    pub scenes: usize,
    pub files: Vec<PathBuf>,
}

/// File stem for a group
#[must_use]
pub fn scene_stem(key: &GroupKey) -> String {
    match key {
        GroupKey::Category(category) => format!("category-{category}"),
        GroupKey::Day(day) => format!("day-{day}"),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T, summary: &mut ExportSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {}", path.display());
    summary.files.push(path.to_path_buf());
    Ok(())
}

/// Write every group of both groupings in every language under `out`
pub fn export_site(ctx: &AppContext, out: &Path) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();
    let index = ctx.group_index();
    let translator = &ctx.translator;

    write_json(
        &out.join("manifest.json"),
        &Manifest {
            version: crate::VERSION,
            default_language: ctx.config.language.default,
            languages: Language::ALL.to_vec(),
        },
        &mut summary,
    )?;

    for lang in Language::ALL {
        let lang_dir = out.join(lang.code());
        let category_keys = index.keys(GroupingMode::ByCategory);
        let day_keys = index.keys(GroupingMode::ByDay);

        let link = |key: &GroupKey| GroupLink {
            key: key.clone(),
            label: index.label(key, lang, translator).unwrap_or_default(),
            file: format!("scenes/{}.json", scene_stem(key)),
        };
        let listing = GroupListing {
            by_category: category_keys.iter().map(link).collect(),
            by_day: day_keys.iter().map(link).collect(),
        };
        write_json(&lang_dir.join("groups.json"), &listing, &mut summary)?;

        let mut places: Vec<PlaceName<'_>> = ctx
            .catalog
            .all_places()
            .map(|place| PlaceName {
                id: place.id,
                name: place.name.get(lang),
            })
            .collect();
        places.sort_by_key(|place| place.id);
        write_json(&lang_dir.join("places.json"), &places, &mut summary)?;

        let Some(first) = category_keys.first().cloned() else {
            continue;
        };
        let settings = ctx.viewport_settings();
        let options = MapOptions::new(
            Viewport {
                center: TAIWAN_CENTER,
                zoom: settings.initial_zoom,
            },
            lang,
        );
        let mut view = MapView::new(SceneSurface::new(&options), ctx.map_data(), settings, first, lang)?;

        for key in category_keys.iter().chain(day_keys.iter()) {
            let outcome = view.rebuild(key.clone(), lang)?;
            let file = SceneFile {
                key: key.clone(),
                label: index.label(key, lang, translator).unwrap_or_default(),
                scene: view.surface().scene(),
                entries: view.list_entries(),
                missing: outcome.missing,
                no_data: outcome.no_data,
            };
            write_json(
                &lang_dir.join("scenes").join(format!("{}.json", scene_stem(key))),
                &file,
                &mut summary,
            )?;
            summary.scenes += 1;
        }
        summary.languages += 1;
    }

    info!(
        "Exported {} scenes in {} languages to {}",
        summary.scenes,
        summary.languages,
        out.display()
    );
    Ok(summary)
}
