pub(crate) mod args;
pub mod calendar;
pub mod collection;
pub mod config;
pub mod debtor;
pub mod system;
pub mod transfer;

use crate::cli::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    let groups = [
        debtor::definitions(),
        collection::definitions(),
        calendar::definitions(),
        transfer::definitions(),
        config::definitions(),
        system::definitions(),
    ];
    for entry in groups.into_iter().flatten() {
        registry.register(entry);
    }
}
