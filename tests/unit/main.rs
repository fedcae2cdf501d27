//! Unit test modules.

mod embers_test;
mod fireflies_test;
mod leaves_test;
mod lens_flare_test;
mod sun_test;
mod wind_test;
