mod commands;
mod handlers;

pub use commands::{
    CigarAction, CigarCommand, Cli, Commands, PhaseTwoArgs, TastingAction, TastingCommand,
};
pub use handlers::{
    handle_cigar_add, handle_cigar_get, handle_cigar_list, handle_cigar_search, handle_init,
    handle_serve, handle_stats, handle_tasting_delete, handle_tasting_finalize,
    handle_tasting_get, handle_tasting_list, handle_tasting_start, handle_tasting_update,
};
