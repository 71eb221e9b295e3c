use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Edit storefront navigation menus")]
pub struct Cli {
    /// Path to the menu file (.yaml, or .db/.sqlite for SQLite)
    #[clap(long, global = true)]
    pub file: Option<PathBuf>,

    /// Show debug logging (overridden by NAVMENU_LOG)
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Menu management commands
    #[clap(subcommand)]
    Menu(MenuCommand),

    /// Menu item commands
    #[clap(subcommand)]
    Item(ItemCommand),

    /// Export a menu
    Export {
        /// Menu name or UUID
        menu: String,

        /// Output format (json, markdown)
        #[clap(long, short = 'f', default_value = "json")]
        format: String,

        /// Output file path (prints to stdout when omitted)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Storage commands
    #[clap(subcommand)]
    Db(DbCommand),
}

#[derive(Subcommand, Debug)]
pub enum MenuCommand {
    /// List all menus
    List {
        /// Only the active menus rendered at this location
        #[clap(long)]
        location: Option<String>,
    },

    /// Show a menu and its items
    Show {
        /// Menu name or UUID
        menu: String,
    },

    /// Create a new, empty menu
    Create {
        /// Name of the menu
        #[clap(long)]
        name: Option<String>,

        /// Where the menu is rendered (header, footer, sidebar, mobile)
        #[clap(long)]
        location: Option<String>,

        /// Rendering style (simple, dropdown, mega)
        #[clap(long)]
        style: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Delete a menu
    Delete {
        /// Menu name or UUID
        menu: String,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Show a menu on the storefront
    Activate {
        /// Menu name or UUID
        menu: String,
    },

    /// Hide a menu from the storefront without deleting it
    Deactivate {
        /// Menu name or UUID
        menu: String,
    },

    /// Check a menu for broken parent references, cycles and depth
    Check {
        /// Menu name or UUID
        menu: String,

        /// Rewrite the menu so every problem is fixed
        #[clap(long)]
        repair: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Append an item to a menu
    Add {
        /// Menu name or UUID
        menu: String,

        #[clap(long)]
        label: Option<String>,

        #[clap(long)]
        url: Option<String>,

        /// Parent item (UUID, 1-based position or label)
        #[clap(long)]
        parent: Option<String>,

        #[clap(long)]
        icon: Option<String>,

        #[clap(long)]
        description: Option<String>,

        #[clap(long)]
        image: Option<String>,

        /// Append a "New Item" placeholder without prompting
        #[clap(long, conflicts_with_all = ["label", "url", "parent"])]
        placeholder: bool,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Remove an item (its children stay, detached)
    Remove {
        /// Menu name or UUID
        menu: String,

        /// Item UUID, 1-based position or label
        item: String,
    },

    /// Move an item one position up or down
    Move {
        /// Menu name or UUID
        menu: String,

        /// Item UUID, 1-based position or label
        item: String,

        /// up or down
        direction: String,
    },

    /// Drag an item to a new position
    Reorder {
        /// Menu name or UUID
        menu: String,

        /// Item UUID, 1-based position or label
        item: String,

        /// Target 1-based position
        #[clap(long)]
        to: usize,
    },

    /// Nest an item under the item above it
    Indent {
        /// Menu name or UUID
        menu: String,

        /// Item UUID, 1-based position or label
        item: String,
    },

    /// Move an item one level up
    Outdent {
        /// Menu name or UUID
        menu: String,

        /// Item UUID, 1-based position or label
        item: String,
    },

    /// Edit an item's fields
    Edit {
        /// Menu name or UUID
        menu: String,

        /// Item UUID, 1-based position or label
        item: String,

        #[clap(long)]
        label: Option<String>,

        #[clap(long)]
        url: Option<String>,

        /// New parent item (UUID, 1-based position or label)
        #[clap(long, conflicts_with = "clear_parent")]
        parent: Option<String>,

        /// Make the item top level
        #[clap(long)]
        clear_parent: bool,

        /// Icon name (empty string clears it)
        #[clap(long)]
        icon: Option<String>,

        /// Description (empty string clears it)
        #[clap(long)]
        description: Option<String>,

        /// Image URL (empty string clears it)
        #[clap(long)]
        image: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Print the path and backend of the menu file
    Path,

    /// Show menu and item counts
    Stats,

    /// Copy all menus into another file, switching between YAML and SQLite
    Migrate {
        /// Destination file (.yaml or .db)
        #[clap(long)]
        to: PathBuf,
    },

    /// Replace all menus with the contents of a JSON file
    Import {
        /// JSON file produced by `db dump`
        json: PathBuf,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Write all menus to a JSON file
    Dump {
        /// Destination JSON file
        output: PathBuf,
    },
}
