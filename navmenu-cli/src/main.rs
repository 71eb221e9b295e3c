mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use navmenu_core::db::{
    export_backend_to_json, import_json_to_backend, migrate_sqlite_to_yaml, migrate_yaml_to_sqlite,
};
use navmenu_core::{
    determine_menu_path, export, hierarchy, open_or_create, tree, BackendType, Direction,
    ExportFormat, Menu, MenuBackend, MenuEditor, MenuError, MenuItem, MenuItemPatch, MenuLocation,
    MenuStyle, MenuTree, MAX_DEPTH,
};

use crate::cli::{Cli, Command, DbCommand, ItemCommand, MenuCommand};

/// Environment variable holding the log filter
const LOG_ENV: &str = "NAVMENU_LOG";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine which menu file to use
    let menu_path = determine_menu_path(cli.file.as_deref())?;
    debug!(path = %menu_path.display(), "using menu file");
    let backend = open_or_create(&menu_path, None)
        .with_context(|| format!("Failed to open menu file {}", menu_path.display()))?;

    match &cli.command {
        Command::Menu(menu_cmd) => handle_menu_command(menu_cmd, backend.as_ref())?,
        Command::Item(item_cmd) => handle_item_command(item_cmd, backend.as_ref())?,
        Command::Export {
            menu,
            format,
            output,
        } => handle_export_command(backend.as_ref(), menu, format, output.as_deref())?,
        Command::Db(db_cmd) => handle_db_command(db_cmd, backend.as_ref())?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// =========================================================================
// Menu commands
// =========================================================================

fn handle_menu_command(cmd: &MenuCommand, backend: &dyn MenuBackend) -> Result<()> {
    match cmd {
        MenuCommand::List { location } => {
            let location = location
                .as_deref()
                .map(str::parse::<MenuLocation>)
                .transpose()?;
            list_menus(backend, location)
        }
        MenuCommand::Show { menu } => show_menu(backend, menu),
        MenuCommand::Create {
            name,
            location,
            style,
            interactive,
        } => {
            // Default to interactive mode if no specific arguments are provided
            let should_be_interactive =
                *interactive || (name.is_none() && location.is_none() && style.is_none());

            let (name, location, style) = if should_be_interactive {
                prompts::prompt_new_menu()?
            } else {
                let name = name
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("Menu name is required"))?;
                let location = location
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("Menu location is required"))?
                    .parse::<MenuLocation>()?;
                let style = match style {
                    Some(s) => s.parse::<MenuStyle>()?,
                    None => MenuStyle::default(),
                };
                (name, location, style)
            };

            create_menu(backend, name, location, style)
        }
        MenuCommand::Delete { menu, yes } => delete_menu(backend, menu, *yes),
        MenuCommand::Activate { menu } => set_menu_active(backend, menu, true),
        MenuCommand::Deactivate { menu } => set_menu_active(backend, menu, false),
        MenuCommand::Check { menu, repair } => check_menu(backend, menu, *repair),
    }
}

fn find_menu(backend: &dyn MenuBackend, reference: &str) -> Result<Menu> {
    let store = backend.load()?;
    Ok(store.find_menu(reference)?.clone())
}

fn list_menus(backend: &dyn MenuBackend, location: Option<MenuLocation>) -> Result<()> {
    let store = backend.load()?;
    let menus: Vec<&Menu> = match location {
        Some(location) => store.active_menus_at(location),
        None => store.menus.iter().collect(),
    };

    if menus.is_empty() {
        match location {
            Some(location) => println!("{}", format!("No active menus at {}.", location).yellow()),
            None => println!("{}", "No menus found.".yellow()),
        }
        return Ok(());
    }

    println!(
        "{:<30} | {:<8} | {:<8} | {:<8} | {:>5}",
        "Name", "Location", "Style", "Active", "Items"
    );
    println!("{}", "-".repeat(72));

    for menu in menus {
        let active = if menu.active {
            "yes".green()
        } else {
            "no".red()
        };
        println!(
            "{:<30} | {:<8} | {:<8} | {:<8} | {:>5}",
            menu.name,
            menu.location.to_string(),
            menu.style.to_string(),
            active,
            menu.items.len()
        );
    }

    Ok(())
}

fn show_menu(backend: &dyn MenuBackend, reference: &str) -> Result<()> {
    let menu = find_menu(backend, reference)?;

    println!("{}: {}", "ID".blue(), menu.id);
    println!("{}: {}", "Name".blue(), menu.name);
    println!("{}: {}", "Location".blue(), menu.location);
    println!("{}: {}", "Style".blue(), menu.style);
    let active = if menu.active {
        "yes".green()
    } else {
        "no".red()
    };
    println!("{}: {}", "Active".blue(), active);
    println!(
        "{}: {}",
        "Created".blue(),
        menu.created_at.format("%Y-%m-%d %H:%M")
    );
    println!(
        "{}: {}",
        "Modified".blue(),
        menu.modified_at.format("%Y-%m-%d %H:%M")
    );

    println!("\n{}:", "Items".green());
    print_items(&menu.items);

    Ok(())
}

/// Prints the flat list with positions, indented by depth
fn print_items(items: &[MenuItem]) {
    if items.is_empty() {
        println!("  {}", "(no items)".yellow());
        return;
    }

    let dangling = hierarchy::dangling_parents(items);

    for (index, item) in items.iter().enumerate() {
        let depth = hierarchy::depth_of(items, &item.id);
        let marker = if dangling.contains(&item.id) {
            " (parent missing)".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "{:>4}. {}{} {}{}",
            index + 1,
            "  ".repeat(depth),
            item.label,
            item.url.dimmed(),
            marker
        );
    }
}

fn create_menu(
    backend: &dyn MenuBackend,
    name: String,
    location: MenuLocation,
    style: MenuStyle,
) -> Result<()> {
    let mut menu = Menu::new(name, location);
    menu.style = style;

    let menu = backend.add_menu(menu)?;
    println!(
        "{} Menu '{}' created ({}).",
        "✓".green(),
        menu.name,
        menu.id
    );

    Ok(())
}

fn delete_menu(backend: &dyn MenuBackend, reference: &str, skip_confirm: bool) -> Result<()> {
    let menu = find_menu(backend, reference)?;

    println!("{}", "Menu to delete:".yellow());
    println!("  ID: {}", menu.id);
    println!("  Name: {}", menu.name);
    println!("  Items: {}", menu.items.len());

    // Confirm deletion unless --yes flag is used
    if !skip_confirm && !prompts::confirm("Are you sure you want to delete this menu?")? {
        println!("{}", "Deletion cancelled.".yellow());
        return Ok(());
    }

    backend.delete_menu(&menu.id)?;
    println!("{}", "Menu deleted successfully!".green());

    Ok(())
}

fn set_menu_active(backend: &dyn MenuBackend, reference: &str, active: bool) -> Result<()> {
    let mut menu = find_menu(backend, reference)?;

    if menu.active == active {
        println!(
            "{} Menu '{}' is already {}.",
            "!".yellow(),
            menu.name,
            if active { "active" } else { "inactive" }
        );
        return Ok(());
    }

    menu.active = active;
    menu.touch();
    backend.update_menu(&menu)?;

    println!(
        "{} Menu '{}' {}.",
        "✓".green(),
        menu.name,
        if active { "activated" } else { "deactivated" }
    );

    Ok(())
}

fn check_menu(backend: &dyn MenuBackend, reference: &str, repair: bool) -> Result<()> {
    let mut menu = find_menu(backend, reference)?;
    let problems = tree::problems(&menu.items);

    if problems.is_empty() {
        println!("{} Menu '{}' is a valid tree.", "✓".green(), menu.name);
        return Ok(());
    }

    println!(
        "{} Menu '{}' has {} problem(s):",
        "✗".red(),
        menu.name,
        problems.len()
    );
    for problem in &problems {
        println!("  - {}", problem);
    }

    if !repair {
        println!("Run again with {} to fix them.", "--repair".cyan());
        anyhow::bail!("Menu '{}' is not a valid tree", menu.name);
    }

    // Detached items move to the top level; over-deep items are lifted
    // until they fit
    let mut repaired = MenuTree::from_items(&menu.items).to_items();
    flatten_excess_depth(&mut repaired);

    menu.replace_items(repaired);
    backend.update_menu(&menu)?;

    let remaining = tree::problems(&menu.items);
    if remaining.is_empty() {
        println!("{} Menu '{}' repaired.", "✓".green(), menu.name);
    } else {
        anyhow::bail!("{} problem(s) remain after repair", remaining.len());
    }

    Ok(())
}

/// Re-parents items deeper than [`MAX_DEPTH`] onto their deepest allowed
/// ancestor
fn flatten_excess_depth(items: &mut [MenuItem]) {
    for index in 0..items.len() {
        let id = items[index].id;
        if hierarchy::depth_of(items, &id) <= MAX_DEPTH {
            continue;
        }
        // Nearest ancestor sitting at MAX_DEPTH - 1
        let new_parent = hierarchy::ancestors(items, &id)
            .into_iter()
            .find(|ancestor| hierarchy::depth_of(items, ancestor) == MAX_DEPTH - 1);
        items[index].parent_id = new_parent;
    }
}

// =========================================================================
// Item commands
// =========================================================================

/// Runs `op` against an editor over one menu's items and saves the menu if
/// the editor reported a change
fn edit_menu<T, F>(backend: &dyn MenuBackend, reference: &str, op: F) -> Result<T>
where
    F: FnOnce(&mut MenuEditor) -> Result<T>,
{
    let mut menu = find_menu(backend, reference)?;

    let latest: Rc<RefCell<Option<Vec<MenuItem>>>> = Rc::new(RefCell::new(None));
    let mut editor = MenuEditor::new(menu.items.clone());
    let sink = Rc::clone(&latest);
    editor.on_change(move |items| {
        *sink.borrow_mut() = Some(items.to_vec());
    });

    let result = op(&mut editor)?;

    let changed = latest.borrow_mut().take();
    if let Some(items) = changed {
        menu.replace_items(items);
        backend.update_menu(&menu)?;
    }

    Ok(result)
}

fn handle_item_command(cmd: &ItemCommand, backend: &dyn MenuBackend) -> Result<()> {
    match cmd {
        ItemCommand::Add {
            menu,
            label,
            url,
            parent,
            icon,
            description,
            image,
            placeholder,
            interactive,
        } => {
            let should_be_interactive = *interactive
                || (!*placeholder
                    && label.is_none()
                    && url.is_none()
                    && parent.is_none()
                    && icon.is_none()
                    && description.is_none()
                    && image.is_none());

            let (id, requested_parent) = edit_menu(backend, menu, |editor| {
                if *placeholder {
                    return Ok((editor.add(), None));
                }

                let item = if should_be_interactive {
                    prompts::prompt_new_item(editor)?
                } else {
                    let mut item = MenuItem::new(
                        label.clone().unwrap_or_else(|| navmenu_core::DEFAULT_ITEM_LABEL.into()),
                        url.clone().unwrap_or_else(|| navmenu_core::DEFAULT_ITEM_URL.into()),
                    );
                    if let Some(parent_ref) = parent {
                        item.parent_id = Some(parse_item_ref(editor.items(), parent_ref)?);
                    }
                    item.icon = icon.clone();
                    item.description = description.clone();
                    item.image = image.clone();
                    item
                };

                let requested_parent = item.parent_id;
                Ok((editor.add_item(item), requested_parent))
            })?;

            let saved = find_menu(backend, menu)?;
            let position = hierarchy::position(&saved.items, &id).map_or(0, |p| p + 1);
            if let Some(item) = saved.get_item(&id) {
                println!(
                    "{} Added '{}' at position {}.",
                    "✓".green(),
                    item.label,
                    position
                );
                if requested_parent.is_some() && item.parent_id.is_none() {
                    println!(
                        "{} The parent is already at the maximum depth of {}; the item was added at the top level.",
                        "!".yellow(),
                        MAX_DEPTH
                    );
                }
            }
        }
        ItemCommand::Remove { menu, item } => {
            let label = edit_menu(backend, menu, |editor| {
                let id = parse_item_ref(editor.items(), item)?;
                let label = item_label(editor, &id);
                let children = hierarchy::children_of(editor.items(), Some(&id)).len();
                editor.remove(&id);
                if children > 0 {
                    println!(
                        "{} {} child item(s) of '{}' are now detached and shown at the top level.",
                        "!".yellow(),
                        children,
                        label
                    );
                }
                Ok(label)
            })?;
            println!("{} Removed '{}'.", "✓".green(), label);
        }
        ItemCommand::Move {
            menu,
            item,
            direction,
        } => {
            let direction = parse_direction(direction)?;
            edit_menu(backend, menu, |editor| {
                let id = parse_item_ref(editor.items(), item)?;
                let label = item_label(editor, &id);
                if editor.move_item(&id, direction) {
                    println!("{} Moved '{}' {}.", "✓".green(), label, direction);
                } else {
                    println!(
                        "{} '{}' is already at the {} of the menu.",
                        "!".yellow(),
                        label,
                        if direction == Direction::Up { "top" } else { "bottom" }
                    );
                }
                Ok(())
            })?;
        }
        ItemCommand::Reorder { menu, item, to } => {
            edit_menu(backend, menu, |editor| {
                let id = parse_item_ref(editor.items(), item)?;
                if *to == 0 || *to > editor.len() {
                    anyhow::bail!(
                        "Position {} is out of range (menu has {} items)",
                        to,
                        editor.len()
                    );
                }
                let label = item_label(editor, &id);
                if editor.reorder(&id, to - 1) {
                    println!("{} Moved '{}' to position {}.", "✓".green(), label, to);
                } else {
                    println!("{} '{}' is already at position {}.", "!".yellow(), label, to);
                }
                Ok(())
            })?;
        }
        ItemCommand::Indent { menu, item } => {
            edit_menu(backend, menu, |editor| {
                let id = parse_item_ref(editor.items(), item)?;
                let index = editor.index_of(&id).context("Item not found")?;
                let label = item_label(editor, &id);
                let reason = indent_refusal(editor, index);
                if editor.indent(index) {
                    println!("{} Indented '{}'.", "✓".green(), label);
                } else {
                    println!(
                        "{} Cannot indent '{}': {}.",
                        "!".yellow(),
                        label,
                        reason.unwrap_or("not allowed here")
                    );
                }
                Ok(())
            })?;
        }
        ItemCommand::Outdent { menu, item } => {
            edit_menu(backend, menu, |editor| {
                let id = parse_item_ref(editor.items(), item)?;
                let index = editor.index_of(&id).context("Item not found")?;
                let label = item_label(editor, &id);
                if editor.outdent(index) {
                    println!("{} Outdented '{}'.", "✓".green(), label);
                } else {
                    println!("{} '{}' is already at the top level.", "!".yellow(), label);
                }
                Ok(())
            })?;
        }
        ItemCommand::Edit {
            menu,
            item,
            label,
            url,
            parent,
            clear_parent,
            icon,
            description,
            image,
            interactive,
        } => {
            let should_be_interactive = *interactive
                || (label.is_none()
                    && url.is_none()
                    && parent.is_none()
                    && !*clear_parent
                    && icon.is_none()
                    && description.is_none()
                    && image.is_none());

            edit_menu(backend, menu, |editor| {
                let id = parse_item_ref(editor.items(), item)?;

                if should_be_interactive {
                    editor.begin_edit(&id);
                    let patch = prompts::prompt_item_patch(editor, &id)?;
                    if patch.is_empty() {
                        editor.cancel_edit();
                        println!("{}", "No changes made.".yellow());
                        return Ok(());
                    }
                    if let Some(draft) = editor.draft_mut() {
                        *draft = patch;
                    }
                    editor.commit_edit().map_err(with_parent_hint)?;
                } else {
                    let mut patch = MenuItemPatch::new();
                    if let Some(label) = label {
                        patch = patch.label(label.clone());
                    }
                    if let Some(url) = url {
                        patch = patch.url(url.clone());
                    }
                    if *clear_parent {
                        patch = patch.parent(None);
                    } else if let Some(parent_ref) = parent {
                        patch = patch.parent(Some(parse_item_ref(editor.items(), parent_ref)?));
                    }
                    if let Some(icon) = icon {
                        patch = patch.icon(Some(icon.clone()));
                    }
                    if let Some(description) = description {
                        patch = patch.description(Some(description.clone()));
                    }
                    if let Some(image) = image {
                        patch = patch.image(Some(image.clone()));
                    }
                    editor.update_item(&id, &patch).map_err(with_parent_hint)?;
                }

                println!("{} Updated '{}'.", "✓".green(), item_label(editor, &id));
                Ok(())
            })?;
        }
    }

    Ok(())
}

fn with_parent_hint(err: MenuError) -> anyhow::Error {
    if err.is_structural() {
        anyhow::anyhow!(
            "{}\nRun `navmenu item edit <menu> <item>` without flags to choose from the allowed parents",
            err
        )
    } else {
        err.into()
    }
}

fn item_label(editor: &MenuEditor, id: &Uuid) -> String {
    editor
        .get(id)
        .map(|item| item.label.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Explains why the item at `index` cannot be indented, if it cannot
fn indent_refusal(editor: &MenuEditor, index: usize) -> Option<&'static str> {
    if editor.can_indent(index) {
        return None;
    }
    let items = editor.items();
    if index == 0 {
        return Some("it is the first item");
    }
    let item = &items[index];
    let above = &items[index - 1];
    if item.parent_id == Some(above.id) {
        Some("it is already nested under the item above")
    } else if hierarchy::would_create_cycle(items, &item.id, &above.id) {
        Some("the item above is one of its own children")
    } else {
        Some("the menu would exceed the maximum depth")
    }
}

/// Resolves an item reference: UUID, 1-based position, or exact label
fn parse_item_ref(items: &[MenuItem], reference: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(reference) {
        if hierarchy::find(items, &id).is_some() {
            return Ok(id);
        }
        anyhow::bail!("Item not found: {}", reference);
    }

    if let Ok(position) = reference.parse::<usize>() {
        if position == 0 || position > items.len() {
            anyhow::bail!(
                "Position {} is out of range (menu has {} items)",
                position,
                items.len()
            );
        }
        return Ok(items[position - 1].id);
    }

    let matches: Vec<&MenuItem> = items.iter().filter(|i| i.label == reference).collect();
    match matches.as_slice() {
        [item] => Ok(item.id),
        [] => anyhow::bail!("Item not found: {}", reference),
        _ => anyhow::bail!(
            "Label '{}' matches {} items; use a position or UUID",
            reference,
            matches.len()
        ),
    }
}

fn parse_direction(direction_str: &str) -> Result<Direction> {
    match direction_str.to_lowercase().as_str() {
        "up" => Ok(Direction::Up),
        "down" => Ok(Direction::Down),
        _ => anyhow::bail!("Invalid direction: {} (expected up or down)", direction_str),
    }
}

// =========================================================================
// Export and storage commands
// =========================================================================

fn handle_export_command(
    backend: &dyn MenuBackend,
    reference: &str,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let format = format.parse::<ExportFormat>()?;
    let menu = find_menu(backend, reference)?;

    match output {
        Some(path) => {
            export::export_menu(&menu, format, path)?;
            println!("Exported '{}' to {}", menu.name, path.display());
        }
        None => println!("{}", export::render(&menu, format)?.trim_end()),
    }

    Ok(())
}

fn handle_db_command(cmd: &DbCommand, backend: &dyn MenuBackend) -> Result<()> {
    match cmd {
        DbCommand::Path => {
            println!("{} ({})", backend.path().display(), backend.backend_type());
        }
        DbCommand::Stats => {
            let stats = backend.stats()?;
            println!("{}: {}", "Backend".blue(), stats.backend_type);
            println!(
                "{}: {} ({} active)",
                "Menus".blue(),
                stats.menu_count,
                stats.active_menu_count
            );
            println!("{}: {}", "Items".blue(), stats.item_count);
        }
        DbCommand::Migrate { to } => {
            let target = BackendType::from_path(to);
            let count = match (backend.backend_type(), target) {
                (BackendType::Yaml, BackendType::Sqlite) => {
                    migrate_yaml_to_sqlite(backend.path(), to)?
                }
                (BackendType::Sqlite, BackendType::Yaml) => {
                    migrate_sqlite_to_yaml(backend.path(), to)?
                }
                (source, _) => anyhow::bail!(
                    "Source and destination are both {} files; nothing to migrate",
                    source
                ),
            };
            println!(
                "{} Migrated {} menu(s) to {}.",
                "✓".green(),
                count,
                to.display()
            );
        }
        DbCommand::Import { json, yes } => {
            if !*yes
                && !prompts::confirm(&format!(
                    "Replace all menus in {} with the contents of {}?",
                    backend.path().display(),
                    json.display()
                ))?
            {
                println!("{}", "Import cancelled.".yellow());
                return Ok(());
            }
            let count = import_json_to_backend(json, backend)?;
            println!("{} Imported {} menu(s).", "✓".green(), count);
        }
        DbCommand::Dump { output } => {
            export_backend_to_json(backend, output)?;
            println!("Exported all menus to {}", output.display());
        }
    }

    Ok(())
}
