#[cfg(test)]
mod tests {
    use crate::config::{FocalLossParameter, LayerParameter};
    use crate::device::StorageDevice;
    use crate::error::FocalRustError;
    use crate::nn::layer::Layer;
    use crate::nn::layers::FocalLossLayer;
    use crate::nn::losses::focal::PropagateDown;
    use crate::tensor::{scalar, zeros, Tensor};
    use crate::utils::testing::check_slice_near;
    use approx::assert_relative_eq;

    fn make_layer(alpha: Vec<f32>, gamma: f32) -> FocalLossLayer<f64> {
        FocalLossLayer::from_parameter("loss", FocalLossParameter::new(alpha, gamma))
    }

    fn bottoms(device: StorageDevice) -> Vec<Tensor<f64>> {
        vec![
            Tensor::new_on(vec![0.7, 0.2, 0.1, 0.1, 0.3, 0.6], vec![2, 3], device).expect("probabilities"),
            Tensor::new_on(vec![0.0, 2.0], vec![2], device).expect("labels"),
        ]
    }

    #[test]
    fn test_new_rejects_other_layer_types() {
        let mut param = LayerParameter::focal_loss("loss", FocalLossParameter::default());
        param.layer_type = "SoftmaxWithLoss".to_string();
        let err = FocalLossLayer::<f32>::new(&param).unwrap_err();
        assert!(matches!(err, FocalRustError::LayerTypeMismatch { .. }));
    }

    #[test]
    fn test_blob_count_bounds() {
        let layer = make_layer(vec![], 2.0);
        assert!(layer.check_blob_counts(2, 1).is_ok());
        assert!(layer.check_blob_counts(3, 2).is_ok());
        assert!(matches!(
            layer.check_blob_counts(1, 1),
            Err(FocalRustError::BlobCountMismatch { kind: "bottom", actual: 1, .. })
        ));
        assert!(matches!(
            layer.check_blob_counts(2, 3),
            Err(FocalRustError::BlobCountMismatch { kind: "top", actual: 3, .. })
        ));
    }

    #[test]
    fn test_setup_derives_class_count() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![1.0, 2.0, 3.0], 2.0);
        let bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        let kernel = layer.kernel().expect("kernel configured");
        assert_eq!(kernel.class_count(), 3);
        assert_eq!(kernel.alphas(), &[1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_setup_surfaces_config_errors() {
        let mut layer = make_layer(vec![1.0, 2.0], 2.0);
        let bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        assert!(matches!(layer.setup(&bottom, &mut top), Err(FocalRustError::Config(_))));
    }

    #[test]
    fn test_reshape_sets_scalar_top() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![], 2.0);
        let bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        layer.reshape(&bottom, &mut top)?;
        assert_eq!(top[0].shape(), &[1]);
        Ok(())
    }

    #[test]
    fn test_reshape_rejects_label_count() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![], 2.0);
        let mut bottom = bottoms(StorageDevice::CPU);
        bottom[1] = Tensor::new(vec![0.0], vec![1])?;
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        assert!(matches!(layer.reshape(&bottom, &mut top), Err(FocalRustError::ShapeMismatch { .. })));
        Ok(())
    }

    #[test]
    fn test_forward_before_setup_fails() {
        let mut layer = make_layer(vec![], 2.0);
        let bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![scalar(0.0)];
        assert_eq!(
            layer.forward(&bottom, &mut top),
            Err(FocalRustError::LayerNotSetUp("loss".to_string()))
        );
    }

    #[test]
    fn test_forward_writes_loss_and_caches_normalizer() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![1.0, 1.0, 1.0], 0.0);
        let bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        layer.reshape(&bottom, &mut top)?;
        layer.forward(&bottom, &mut top)?;

        let expected = -(0.7f64.ln() + 0.6f64.ln()) / 2.0;
        assert_relative_eq!(top[0].data()[0], expected, epsilon = 1e-12);
        let normalizer = layer.cached_normalizer().expect("normalizer cached");
        assert_eq!(normalizer.value(), 2.0);
        Ok(())
    }

    #[test]
    fn test_backward_before_forward_fails() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![], 2.0);
        let mut bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        let result = layer.backward(&top, &[true, false], &mut bottom);
        assert_eq!(result, Err(FocalRustError::BackwardBeforeForward));
        Ok(())
    }

    #[test]
    fn test_backward_uses_top_gradient_as_loss_weight() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![0.5, 1.0, 2.0], 2.0);
        let mut bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        layer.reshape(&bottom, &mut top)?;
        layer.forward(&bottom, &mut top)?;
        top[0].set_grad(vec![4.0])?;
        layer.backward(&top, &[true, false], &mut bottom)?;

        let kernel = layer.kernel().expect("kernel configured");
        let normalizer = layer.cached_normalizer().expect("normalizer cached");
        let expected = kernel
            .backward(bottom[0].data(), bottom[1].data(), 4.0, &normalizer, PropagateDown::probabilities_only())?
            .expect("gradient requested");
        let grad = bottom[0].grad().expect("gradient written");
        check_slice_near(grad, &expected, 1e-12);
        assert_eq!(grad[1], 0.0);
        assert!(bottom[1].grad().is_none(), "labels never receive a gradient");
        Ok(())
    }

    #[test]
    fn test_backward_defaults_to_unit_loss_weight() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![], 0.0);
        let mut bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        layer.forward(&bottom, &mut top)?;
        layer.backward(&top, &[true], &mut bottom)?;
        let grad = bottom[0].grad().expect("gradient written");
        // gamma = 0: -1 / (p * batch_size)
        assert_relative_eq!(grad[0], -1.0 / (0.7 * 2.0), epsilon = 1e-12);
        assert_relative_eq!(grad[5], -1.0 / (0.6 * 2.0), epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_backward_skipped_without_propagation() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![], 2.0);
        let mut bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        layer.forward(&bottom, &mut top)?;
        layer.backward(&top, &[false, false], &mut bottom)?;
        assert!(bottom[0].grad().is_none());
        Ok(())
    }

    #[test]
    #[should_panic(expected = "cannot backpropagate to label inputs")]
    fn test_backward_to_labels_panics() {
        let mut layer = make_layer(vec![], 2.0);
        let mut bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top).expect("setup");
        layer.forward(&bottom, &mut top).expect("forward");
        let _ = layer.backward(&top, &[true, true], &mut bottom);
    }

    #[test]
    fn test_failed_backward_keeps_host_gradient() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![], 2.0);
        let mut bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        layer.forward(&bottom, &mut top)?;

        bottom[0].set_grad(vec![5.0; 6])?;
        bottom[1].data_mut()[1] = 9.0;
        let result = layer.backward(&top, &[true, false], &mut bottom);
        assert!(matches!(result, Err(FocalRustError::InvalidLabel { index: 1, .. })));
        assert_eq!(bottom[0].grad(), Some(&[5.0; 6][..]));
        Ok(())
    }

    #[test]
    fn test_gpu_bottoms_fall_back_to_cpu() -> Result<(), FocalRustError> {
        let mut cpu_layer = make_layer(vec![0.5, 1.0, 2.0], 2.0);
        let mut gpu_layer = make_layer(vec![0.5, 1.0, 2.0], 2.0);
        let mut cpu_bottom = bottoms(StorageDevice::CPU);
        let mut gpu_bottom = bottoms(StorageDevice::GPU);
        let mut cpu_top = vec![zeros::<f64>(&[0])];
        let mut gpu_top = vec![zeros::<f64>(&[0])];

        cpu_layer.setup(&cpu_bottom, &mut cpu_top)?;
        gpu_layer.setup(&gpu_bottom, &mut gpu_top)?;
        cpu_layer.forward(&cpu_bottom, &mut cpu_top)?;
        gpu_layer.forward(&gpu_bottom, &mut gpu_top)?;
        cpu_layer.backward(&cpu_top, &[true, false], &mut cpu_bottom)?;
        gpu_layer.backward(&gpu_top, &[true, false], &mut gpu_bottom)?;

        assert_eq!(cpu_top[0].data(), gpu_top[0].data());
        assert_eq!(cpu_bottom[0].grad(), gpu_bottom[0].grad());
        Ok(())
    }

    #[test]
    fn test_class_count_change_after_setup_fails() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![], 2.0);
        let bottom = bottoms(StorageDevice::CPU);
        let mut top = vec![zeros::<f64>(&[0])];
        layer.setup(&bottom, &mut top)?;
        let wider = vec![
            Tensor::new(vec![0.25; 8], vec![2, 4])?,
            Tensor::new(vec![0.0, 1.0], vec![2])?,
        ];
        assert!(matches!(layer.forward(&wider, &mut top), Err(FocalRustError::ShapeMismatch { .. })));
        Ok(())
    }

    #[test]
    fn test_optional_extra_blobs_are_ignored() -> Result<(), FocalRustError> {
        let mut layer = make_layer(vec![], 2.0);
        let mut bottom = bottoms(StorageDevice::CPU);
        bottom.push(zeros::<f64>(&[2]));
        let mut top = vec![zeros::<f64>(&[0]), scalar(7.0)];
        layer.setup(&bottom, &mut top)?;
        layer.reshape(&bottom, &mut top)?;
        layer.forward(&bottom, &mut top)?;
        assert_eq!(top[1].data(), &[7.0]);
        layer.backward(&top, &[true, false, true], &mut bottom)?;
        assert!(bottom[2].grad().is_none());
        Ok(())
    }
}
