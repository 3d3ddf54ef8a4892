use nalgebra::DVector;

use lib_adtape::driver::{gradient, sparse_hessian};
use lib_adtape::sparse::SparsityExt;
use lib_adtape::Tape;

/// Newton's method on the chained Rosenbrock function, with a Hessian
/// recovered from three sweeps whatever the dimension
fn main() {
  let n = 10;
  let f = Tape::new()
    .scope(|guard| {
      let x = guard.independent(&vec![0.0; n]);
      let mut sum = guard.constant(0.0);
      for pair in x.windows(2) {
        let a = 1.0 - pair[0];
        let b = pair[1] - pair[0] * pair[0];
        sum += a * a + 100.0 * b * b;
      }
      guard.lock().seal(&[sum])
    })
    .expect("recording has inputs and an output");

  let pattern = f.hessian_sparsity(&[true]).expect("pattern");
  println!("hessian pattern ({} entries):\n{pattern}", pattern.nnz());

  let mut x = DVector::from_element(n, -1.2);
  for step in 0..50 {
    let grad = gradient(&f, x.as_slice()).expect("gradient");
    println!("step {step:2}: |grad| = {:.3e}", grad.norm());
    if grad.norm() < 1e-10 {
      break;
    }
    let hes = sparse_hessian(&f, x.as_slice(), &[1.0], &pattern)
      .expect("hessian")
      .to_dense();
    let Some(dx) = hes.lu().solve(&grad) else {
      println!("singular hessian, stopping");
      break;
    };
    x -= dx;
  }
  println!("x = {}", x.transpose());
}
