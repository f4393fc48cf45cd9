//! Plugin System Tests
//!
//! Registry, factory and composition tests against mock libraries and
//! managers.


mod registry_tests;
