pub mod trading_loop;
