pub mod command_mgr;
