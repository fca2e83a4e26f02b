mod console;
mod help;
mod inventory;
mod overlay;

pub(crate) use console::draw_console_panel;
pub(crate) use help::draw_help_panel;
pub(crate) use inventory::draw_inventory_panel;
pub(crate) use overlay::draw_structure_overlay;
