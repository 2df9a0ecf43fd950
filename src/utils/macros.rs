/// Runs `$expr` once per slot count, with `P` bound to a four-shard
/// [`ConstParams`] of that many slots.
///
/// [`ConstParams`]: crate::params::ConstParams
macro_rules! each_params {
  ($expr:expr) => {
    #[cfg(any(coverage, coverage_nightly, miri))]
    {
      $crate::utils::each_params!(
        @impl $expr,
        2, 6, 10,
      );
    }

    #[cfg(not(any(coverage, coverage_nightly, miri)))]
    {
      $crate::utils::each_params!(
        @impl $expr,
        2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
      );
    }
  };
  (@impl $expr:expr, $($bits:expr),+ $(,)?) => {
    $(
      $crate::utils::each_params!(@run $expr, $bits);
    )+
  };
  (@run $expr:expr, $bits:expr) => {{
    type P = $crate::params::ConstParams::<4, { 1 << $bits }>;
    $expr
  }};
}

pub(crate) use each_params;
