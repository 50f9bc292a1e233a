
mod cli_tests;

mod event_tests;
mod watcher_tests;
