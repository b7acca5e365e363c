//! Surface construction: synthetic market, binning, interpolation,
//! coordinate mapping and the refresh pipeline that ties them together.

pub mod binner;
pub mod interpolate;
pub mod mapper;
pub mod pipeline;
pub mod synthetic;

pub use binner::{bin_records, BinnedGrids};
pub use interpolate::fill;
pub use mapper::{gamma_plane, point_cloud, surface_mesh, PointCloud, SurfaceMesh};
pub use pipeline::{
    build_surface, LogStatusSink, RefreshTicket, StatusSink, SurfaceService, SurfaceSnapshot,
};
pub use synthetic::{generate, SyntheticMarket};
