mod dofmap;
mod linked;
mod mesh;
mod sparsity;
mod submesh;
