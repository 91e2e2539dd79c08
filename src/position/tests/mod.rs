//! Position test suite: perft fixtures and property tests.

mod perft;
